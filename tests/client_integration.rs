// Remote data client against a local HTTP endpoint
//
// Each test serves one canned response from a plain TCP listener and checks
// what the client made of it.

use std::{
    io::{Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
    time::Duration,
};

use paddock::{ClientConfig, ErgastClient, PaddockError};

const API_ROOT: &str = "/ergast/f1";

/// Serves a single response and hands back the request line it answered.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}{}", listener.local_addr().unwrap(), API_ROOT);
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buffer = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buffer).unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buffer[..read]);
        }
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });
    (base_url, server)
}

fn client(base_url: &str) -> ErgastClient {
    ErgastClient::new(&ClientConfig {
        base_url: base_url.to_string(),
        timeout: Some(Duration::from_secs(5)),
    })
    .unwrap()
}

#[tokio::test]
async fn test_races_decoded_from_envelope() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"MRData": {"RaceTable": {"season": "2024", "Races": [
            {"season": "2024", "round": "1", "raceName": "Bahrain Grand Prix", "date": "2024-03-02", "time": "15:00:00Z",
             "Circuit": {"circuitId": "bahrain", "circuitName": "Bahrain International Circuit",
                         "Location": {"lat": "26.0325", "long": "50.5106", "locality": "Sakhir", "country": "Bahrain"}}},
            {"season": "2024", "round": "2", "raceName": "Saudi Arabian Grand Prix", "date": "2024-03-09",
             "Sprint": {"date": "2024-03-08", "time": "13:00:00Z"}}
        ]}}}"#,
    );

    let races = client(&base_url).races_by_year("2024").await.unwrap();
    let request_line = server.join().unwrap();

    assert_eq!(request_line, format!("GET {}/2024/races HTTP/1.1", API_ROOT));
    assert_eq!(races.len(), 2);
    assert_eq!(races[0].race_name, "Bahrain Grand Prix");
    assert_eq!(races[0].country(), Some("Bahrain"));
    assert!(!races[0].has_sprint());
    assert!(races[1].has_sprint());
}

#[tokio::test]
async fn test_missing_envelope_is_empty() {
    let (base_url, server) = serve_once("200 OK", r#"{"MRData": {"total": "0"}}"#);

    let stops = client(&base_url).pit_stops("2024", "5").await.unwrap();
    let request_line = server.join().unwrap();

    assert!(stops.is_empty());
    assert!(request_line.starts_with(&format!("GET {}/2024/5/pitstops ", API_ROOT)));
}

#[tokio::test]
async fn test_error_status_surfaces_code() {
    let (base_url, server) = serve_once("503 Service Unavailable", r#"{"error": "maintenance"}"#);

    let result = client(&base_url).driver_standings("2024").await;
    server.join().unwrap();

    let error = result.unwrap_err();
    assert_eq!(error.status(), Some(503));
    assert_eq!(error.to_string(), "HTTP error! status: 503");
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let (base_url, server) = serve_once("200 OK", "<html>gateway</html>");

    let result = client(&base_url).status().await;
    server.join().unwrap();

    assert!(matches!(result, Err(PaddockError::Decode { .. })));
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}{}", listener.local_addr().unwrap(), API_ROOT);
    drop(listener);

    let result = client(&base_url).circuits().await;

    assert!(matches!(result, Err(PaddockError::Transport { .. })));
}
