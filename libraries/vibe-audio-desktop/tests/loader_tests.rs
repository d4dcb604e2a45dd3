//! Track loading from disk and HTTP

use std::io::Write;
use vibe_audio_desktop::{OutputError, TrackLoader};
use vibe_core::Track;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wav_bytes(rate: u32, frames: usize) -> Vec<u8> {
    let data_len = (frames * 4) as u32;
    let mut out = Vec::new();
    out.write_all(b"RIFF").unwrap();
    out.write_all(&(36 + data_len).to_le_bytes()).unwrap();
    out.write_all(b"WAVEfmt ").unwrap();
    out.write_all(&16u32.to_le_bytes()).unwrap();
    out.write_all(&1u16.to_le_bytes()).unwrap();
    out.write_all(&2u16.to_le_bytes()).unwrap();
    out.write_all(&rate.to_le_bytes()).unwrap();
    out.write_all(&(rate * 4).to_le_bytes()).unwrap();
    out.write_all(&4u16.to_le_bytes()).unwrap();
    out.write_all(&16u16.to_le_bytes()).unwrap();
    out.write_all(b"data").unwrap();
    out.write_all(&data_len.to_le_bytes()).unwrap();
    for _ in 0..frames * 2 {
        out.write_all(&1000i16.to_le_bytes()).unwrap();
    }
    out
}

#[tokio::test]
async fn loads_file_uri() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tone.wav");
    std::fs::write(&file, wav_bytes(16000, 1600)).unwrap();

    let uri = url::Url::from_file_path(&file).unwrap().to_string();
    let track = Track::new("tone", "Local Artist", uri);

    let buffer = TrackLoader::new(16000).unwrap().load(&track).await.unwrap();
    assert_eq!(buffer.format.channels, 2);
    assert_eq!(buffer.frames(), 1600);
}

#[tokio::test]
async fn loads_and_resamples_http_track() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio/tone.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_bytes(22050, 22050)))
        .expect(1)
        .mount(&server)
        .await;

    let track = Track::new("Remote", "Artist", format!("{}/audio/tone.wav", server.uri()));
    let buffer = TrackLoader::new(44100).unwrap().load(&track).await.unwrap();

    assert_eq!(buffer.format.sample_rate.as_hz(), 44100);
    let secs = buffer.duration_secs();
    assert!((secs - 1.0).abs() < 0.05, "duration = {secs}");
}

#[tokio::test]
async fn http_error_status_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let track = Track::new("Gone", "Artist", format!("{}/gone.mp3", server.uri()));
    let err = TrackLoader::new(44100).unwrap().load(&track).await.unwrap_err();
    assert!(matches!(err, OutputError::FetchStatus(404)));
}

#[tokio::test]
async fn missing_file_fails() {
    let track = Track::new("Missing", "Artist", "file:///definitely/not/here.wav");
    let err = TrackLoader::new(44100).unwrap().load(&track).await.unwrap_err();
    assert!(matches!(err, OutputError::Io(_)));
}
