use crate::*;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use jukebox_core::{FrameWriter, Message, Request};

const QUEEN: &str = "Queen - Bohemian Rhapsody.mp3";

/// A client speaking garbage loses its own connection and nobody else's.
#[tokio::test]
async fn test_malformed_request_is_isolated() {
    let song = patterned(2500);
    let server = TestServer::start("malformed", &[QUEEN], &[(QUEEN, song.as_slice())])
        .await
        .unwrap();

    let mut good = server.client().await.unwrap();
    assert_eq!(good.list_catalog().await.unwrap().len(), 1);

    let mut bad = TcpStream::connect(server.addr).await.unwrap();
    bad.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

    // The server drops the bad connection without answering.
    let mut buf = [0u8; 16];
    let n = bad.read(&mut buf).await.unwrap_or(0);
    assert_eq!(n, 0);

    let download = good.download("Queen", "Bohemian Rhapsody").await.unwrap();
    assert_eq!(download.bytes(), song);

    // New connections are still accepted.
    let mut fresh = server.client().await.unwrap();
    assert_eq!(fresh.list_catalog().await.unwrap().len(), 1);
}

/// A client that vanishes mid-download does not disturb the others.
#[tokio::test]
async fn test_abandoned_download_is_isolated() {
    let song = patterned(64 * 1024);
    let server = TestServer::start("abandoned", &[QUEEN], &[(QUEEN, song.as_slice())])
        .await
        .unwrap();

    {
        let quitter = TcpStream::connect(server.addr).await.unwrap();
        let mut frames = FrameWriter::new(quitter);
        frames
            .send(&Message::Request(Request::DownloadSong {
                artist: "Queen".into(),
                song: "Bohemian Rhapsody".into(),
            }))
            .await
            .unwrap();
    }

    let mut client = server.client().await.unwrap();
    let download = client.download("Queen", "Bohemian Rhapsody").await.unwrap();
    assert_eq!(download.bytes(), song);
}

#[tokio::test]
async fn test_concurrent_clients() {
    let small = patterned(1500);
    let large = patterned(20_000);
    let nirvana = "Nirvana - Lithium.mp3";
    let server = TestServer::start(
        "concurrent",
        &[QUEEN, nirvana],
        &[(QUEEN, small.as_slice()), (nirvana, large.as_slice())],
    )
    .await
    .unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let addr = server.addr;
        let (artist, title, expected) = if i % 2 == 0 {
            ("Queen", "Bohemian Rhapsody", small.clone())
        } else {
            ("Nirvana", "Lithium", large.clone())
        };
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(addr).await.unwrap();
            for _ in 0..3 {
                let download = client.download(artist, title).await.unwrap();
                assert_eq!(download.bytes(), expected);
                assert_eq!(client.list_catalog().await.unwrap().len(), 2);
            }
            client.close().await.unwrap();
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}
