mod views;

use std::{
    future::Future,
    io::{self, BufRead},
    path::PathBuf,
    sync::Arc,
    thread,
    time::Duration,
};

use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, error, info, warn};
use paddock::{
    AppConfig, ErgastClient, FetchController, FetchOptions, FetchState, PaddockError,
    RevalidationBus,
    analysis::{LapPosition, LapTimeAnalytics, SeasonStatistics, lap_times, pit_stops},
    calendar, export,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Base URL of the championship statistics API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Season to query; the current year when not given
    #[arg(short, long, global = true)]
    season: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Also write the fetched records to this file as JSON lines
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Championship {
    #[default]
    Drivers,
    Constructors,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Race calendar of the season
    Races,
    /// Countdown to the next race
    Next {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Championship standings
    Standings {
        #[arg(value_enum, default_value_t)]
        championship: Championship,
    },
    /// Race classification, for one round or the whole season
    Results { round: Option<String> },
    Qualifying { round: Option<String> },
    Sprint { round: Option<String> },
    /// Pit stop analytics; defaults to the latest race run
    PitStops { round: Option<String> },
    /// Lap time analytics; defaults to the latest race run
    Laps {
        round: Option<String>,

        #[arg(short, long)]
        lap: Option<String>,

        #[arg(short, long)]
        driver: Option<String>,
    },
    Circuits,
    Drivers,
    Constructors,
    /// Finishing status codes
    Status,
    /// Season summary
    Stats,
    /// Show the effective configuration
    Config {
        /// Write it to the config file so later runs pick it up
        #[arg(long)]
        save: bool,
    },
    /// Keep standings on screen, refreshing on a timer and whenever Enter is pressed
    Watch {
        #[arg(value_enum, default_value_t)]
        championship: Championship,

        /// Seconds between refreshes
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

/// What `laps` prints or serializes.
#[derive(Serialize)]
struct LapReport {
    analytics: Option<LapTimeAnalytics>,
    /// Present when a single lap was asked for
    leaderboard: Option<Vec<LapPosition>>,
}

/// Everything a command needs to query and print.
struct Session {
    config: AppConfig,
    client: ErgastClient,
    season: String,
    json: bool,
    output: Option<PathBuf>,
}

/// Runs one query through a fetch controller and waits for it to settle.
async fn load<T, F, Fut>(fetcher: F) -> Result<Arc<T>, PaddockError>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, PaddockError>> + Send + 'static,
{
    let controller = FetchController::new(fetcher, (), FetchOptions::default())?;
    let state = controller.settled().await;
    match (state.data, state.error) {
        (Some(data), _) => Ok(data),
        (None, Some(failure)) => Err(PaddockError::FetchFailed {
            message: failure.to_string(),
        }),
        (None, None) => Err(PaddockError::FetchFailed {
            message: "No data received".to_string(),
        }),
    }
}

impl Session {
    fn new(args: &Args) -> Result<Self, PaddockError> {
        let mut config = AppConfig::from_local_file().unwrap_or_default();
        if let Some(base_url) = &args.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(season) = &args.season {
            config.season = Some(season.clone());
        }
        let season = config
            .season
            .clone()
            .unwrap_or_else(|| Utc::now().year().to_string());
        let client = ErgastClient::new(&config.client_config())?;
        info!("Using {} for season {}", client.base_url(), season);
        Ok(Self {
            config,
            client,
            season,
            json: args.json,
            output: args.output.clone(),
        })
    }

    async fn query<T, F, Fut>(&self, query: F) -> Result<Arc<T>, PaddockError>
    where
        T: Send + Sync + 'static,
        F: Fn(ErgastClient, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PaddockError>> + Send + 'static,
    {
        let client = self.client.clone();
        let season = self.season.clone();
        load(move || query(client.clone(), season.clone())).await
    }

    fn export<T: Serialize>(&self, records: &[T]) -> Result<(), PaddockError> {
        match &self.output {
            Some(path) => export::export_records(path, records),
            None => Ok(()),
        }
    }

    /// Prints `value` as JSON, or hands it to `render` for text output.
    fn show<T: Serialize + ?Sized>(&self, value: &T, render: impl FnOnce(&T)) -> Result<(), PaddockError> {
        if self.json {
            let text = serde_json::to_string_pretty(value)
                .map_err(|e| PaddockError::OutputSerializeError { source: e })?;
            println!("{}", text);
        } else {
            render(value);
        }
        Ok(())
    }

    fn show_records<T: Serialize>(&self, records: &[T], render: impl FnOnce(&[T])) -> Result<(), PaddockError> {
        self.export(records)?;
        self.show(records, render)
    }

    /// Round to analyse and its heading: the round given, else the latest race
    /// run this season.
    async fn resolve_round(&self, round: Option<String>) -> Result<(String, String), PaddockError> {
        if let Some(round) = round {
            let label = self.race_label(&round).await;
            return Ok((round, label));
        }
        let races = self
            .query(|client, season| async move { client.races_by_year(&season).await })
            .await?;
        let latest = calendar::most_recent_race(&races, Utc::now()).ok_or_else(|| {
            PaddockError::InvalidUserInput {
                field: "round".to_string(),
                reason: format!("no race of {} has been run yet", self.season),
            }
        })?;
        debug!("Defaulting to round {} ({})", latest.round, latest.race_name);
        let label = views::race_label(Some(latest), &self.season, &latest.round);
        Ok((latest.round.clone(), label))
    }

    /// Heading for a round given on the command line, from the season calendar.
    async fn race_label(&self, round: &str) -> String {
        let races = self
            .query(|client, season| async move { client.races_by_year(&season).await })
            .await;
        let race = match &races {
            Ok(races) => races.iter().find(|race| race.round == round),
            Err(e) => {
                warn!("Could not look up round {}: {}", round, e);
                None
            }
        };
        views::race_label(race, &self.season, round)
    }

    async fn run(&self, command: Commands) -> Result<(), PaddockError> {
        match command {
            Commands::Races => {
                let races = self
                    .query(|client, season| async move { client.races_by_year(&season).await })
                    .await?;
                self.show_records(&races, |races| views::races(races, Utc::now()))
            }
            Commands::Next { limit } => {
                let limit = limit.unwrap_or(self.config.upcoming_limit);
                let (current, upcoming) = tokio::join!(
                    self.query(|client, _| async move { client.current_race(Utc::now()).await }),
                    self.query(move |client, _| async move {
                        client.upcoming_races(Utc::now(), limit).await
                    }),
                );
                let (current, upcoming) = (current?, upcoming?);
                self.export(&upcoming)?;
                self.show(&*current, |current| {
                    views::next_race(current.as_ref(), &upcoming, Utc::now())
                })
            }
            Commands::Standings { championship } => match championship {
                Championship::Drivers => {
                    let standings = self
                        .query(|client, season| async move { client.driver_standings(&season).await })
                        .await?;
                    self.show_records(&standings, views::driver_standings)
                }
                Championship::Constructors => {
                    let standings = self
                        .query(|client, season| async move {
                            client.constructor_standings(&season).await
                        })
                        .await?;
                    self.show_records(&standings, views::constructor_standings)
                }
            },
            Commands::Results { round } => {
                let races = self
                    .query(move |client, season| {
                        let round = round.clone();
                        async move { client.race_results(&season, round.as_deref()).await }
                    })
                    .await?;
                self.show_records(&races, views::race_results)
            }
            Commands::Qualifying { round } => {
                let races = self
                    .query(move |client, season| {
                        let round = round.clone();
                        async move { client.qualifying_results(&season, round.as_deref()).await }
                    })
                    .await?;
                self.show_records(&races, views::qualifying)
            }
            Commands::Sprint { round } => {
                let races = self
                    .query(move |client, season| {
                        let round = round.clone();
                        async move { client.sprint_results(&season, round.as_deref()).await }
                    })
                    .await?;
                self.show_records(&races, views::sprint_results)
            }
            Commands::PitStops { round } => {
                let (round, label) = self.resolve_round(round).await?;
                let lookup = round.clone();
                let stops = self
                    .query(move |client, season| {
                        let round = lookup.clone();
                        async move { client.pit_stops(&season, &round).await }
                    })
                    .await?;
                self.export(&stops)?;
                let analytics = pit_stops::analyze(&stops);
                self.show(&analytics, |analytics| {
                    views::pit_stops(&label, analytics.as_ref())
                })
            }
            Commands::Laps { round, lap, driver } => {
                let (round, label) = self.resolve_round(round).await?;
                let lookup = (round.clone(), lap.clone());
                let laps = self
                    .query(move |client, season| {
                        let (round, lap) = lookup.clone();
                        async move { client.lap_times(&season, &round, lap.as_deref()).await }
                    })
                    .await?;
                self.export(&laps)?;
                let selected = lap.as_deref().map(|number| {
                    let lap = laps.iter().find(|l| l.number.trim() == number.trim());
                    (number, lap.map(lap_times::lap_leaderboard).unwrap_or_default())
                });
                let report = LapReport {
                    analytics: lap_times::analyze(&laps),
                    leaderboard: selected.as_ref().map(|(_, board)| board.clone()),
                };
                self.show(&report, |report| {
                    views::lap_times(&label, report.analytics.as_ref(), driver.as_deref());
                    if let Some((number, board)) = &selected {
                        views::lap_leaderboard(number, board);
                    }
                })
            }
            Commands::Circuits => {
                let circuits = self
                    .query(|client, _| async move { client.circuits().await })
                    .await?;
                self.show_records(&circuits, views::circuits)
            }
            Commands::Drivers => {
                let drivers = self
                    .query(|client, season| async move { client.drivers(&season).await })
                    .await?;
                self.show_records(&drivers, |drivers| {
                    views::drivers(drivers, Utc::now().date_naive())
                })
            }
            Commands::Constructors => {
                let constructors = self
                    .query(|client, season| async move { client.constructors(&season).await })
                    .await?;
                self.show_records(&constructors, views::constructors)
            }
            Commands::Status => {
                let statuses = self
                    .query(|client, _| async move { client.status().await })
                    .await?;
                self.show_records(&statuses, views::statuses)
            }
            Commands::Stats => {
                let (races, drivers, constructors) = tokio::join!(
                    self.query(|client, season| async move { client.races_by_year(&season).await }),
                    self.query(|client, season| async move { client.driver_standings(&season).await }),
                    self.query(|client, season| async move {
                        client.constructor_standings(&season).await
                    }),
                );
                let stats =
                    SeasonStatistics::compute(&races?, &drivers?, &constructors?, Utc::now());
                self.show(&stats, |stats| views::season_statistics(&self.season, stats))
            }
            Commands::Config { save } => {
                if save {
                    self.config.save()?;
                    info!("Saved config to {:?}", AppConfig::default_path());
                }
                self.show(&self.config, views::config)
            }
            Commands::Watch {
                championship,
                interval,
            } => match championship {
                Championship::Drivers => {
                    self.watch(
                        interval,
                        |client, season| async move { client.driver_standings(&season).await },
                        views::driver_standings,
                    )
                    .await
                }
                Championship::Constructors => {
                    self.watch(
                        interval,
                        |client, season| async move { client.constructor_standings(&season).await },
                        views::constructor_standings,
                    )
                    .await
                }
            },
        }
    }

    /// Prints every state change of a refreshing query until the process is
    /// interrupted. Each line on stdin counts as a focus notification.
    async fn watch<T, F, Fut>(
        &self,
        interval: Option<u64>,
        query: F,
        render: impl Fn(&[T]),
    ) -> Result<(), PaddockError>
    where
        T: Serialize + Send + Sync + 'static,
        F: Fn(ErgastClient, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, PaddockError>> + Send + 'static,
    {
        let bus = RevalidationBus::new();
        let mut options = self.config.fetch_options(Some(bus.clone()));
        options.revalidate_on_focus = true;
        if let Some(seconds) = interval {
            options.refresh_interval = Some(Duration::from_secs(seconds));
        }
        info!("Refreshing every {:?}", options.refresh_interval);

        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                if line.is_err() {
                    break;
                }
                bus.notify_focus();
            }
        });

        let client = self.client.clone();
        let season = self.season.clone();
        let controller = FetchController::new(
            move || query(client.clone(), season.clone()),
            self.season.clone(),
            options,
        )?;
        let mut updates = controller.subscribe();
        loop {
            let state: FetchState<Vec<T>> = updates.borrow_and_update().clone();
            if state.loading {
                views::loading(state.data.is_some());
            } else if let Some(failure) = &state.error {
                views::failure(failure);
            } else if let Some(data) = &state.data {
                self.show_records(data, &render)?;
            }
            if updates.changed().await.is_err() {
                return Ok(());
            }
        }
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let args = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Could not start async runtime");

    let result =
        Session::new(&args).and_then(|session| runtime.block_on(session.run(args.command)));
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
