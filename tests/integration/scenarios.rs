use crate::*;

use jukebox_core::wire::{FileHeader, CHUNK_SIZE};

const QUEEN: &str = "Queen - Bohemian Rhapsody.mp3";
const NIRVANA: &str = "Nirvana - Lithium.mp3";

/// The 2500-byte download arrives as 1000 + 1000 + 500.
#[tokio::test]
async fn test_download_in_chunks() {
    let song = patterned(2500);
    let server = TestServer::start("download", &[QUEEN], &[(QUEEN, song.as_slice())])
        .await
        .unwrap();

    let mut client = server.client().await.unwrap();
    let download = client.download("Queen", "Bohemian Rhapsody").await.unwrap();

    assert_eq!(
        download.header,
        FileHeader::found("Queen", "Bohemian Rhapsody", 2500)
    );
    let sizes: Vec<usize> = download.chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![1000, 1000, 500]);
    assert_eq!(download.bytes(), song);

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_song_not_found() {
    let server = TestServer::start("notfound", &[QUEEN], &[(QUEEN, &b"mama"[..])])
        .await
        .unwrap();

    let mut client = server.client().await.unwrap();
    let download = client.download("Unknown", "Nobody").await.unwrap();
    assert_eq!(download.header, FileHeader::not_found());
    assert_eq!(download.header.size, -1);
    assert!(download.chunks.is_empty());

    // The connection is still usable afterwards.
    let again = client.download("Queen", "Bohemian Rhapsody").await.unwrap();
    assert_eq!(again.bytes(), b"mama");
}

/// Listed in the catalog, but the media file was never written.
#[tokio::test]
async fn test_catalogued_but_missing_file_not_found() {
    let server = TestServer::start("nofile", &[QUEEN], &[]).await.unwrap();
    let mut client = server.client().await.unwrap();
    let download = client.download("Queen", "Bohemian Rhapsody").await.unwrap();
    assert!(!download.header.found);
    assert!(download.chunks.is_empty());
}

#[tokio::test]
async fn test_listing_is_complete_and_ordered() {
    let catalog = [QUEEN, NIRVANA, "Radiohead - Airbag.mp3"];
    let server = TestServer::start("listing", &catalog, &[]).await.unwrap();

    let mut client = server.client().await.unwrap();
    let lines = client.list_catalog().await.unwrap();
    assert_eq!(
        lines,
        vec![
            "* \"Bohemian Rhapsody\" by: Queen",
            "* \"Lithium\" by: Nirvana",
            "* \"Airbag\" by: Radiohead",
        ]
    );
}

#[tokio::test]
async fn test_exact_multiple_has_no_empty_chunk() {
    let song = patterned(3 * CHUNK_SIZE);
    let server = TestServer::start("multiple", &[NIRVANA], &[(NIRVANA, song.as_slice())])
        .await
        .unwrap();

    let mut client = server.client().await.unwrap();
    let download = client.download("Nirvana", "Lithium").await.unwrap();
    assert_eq!(download.chunks.len(), 3);
    assert!(download.chunks.iter().all(|c| c.len() == CHUNK_SIZE));
    assert_eq!(download.bytes(), song);

    // Nothing stray left on the stream: the next response parses cleanly.
    assert_eq!(client.list_catalog().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_file_has_no_chunks() {
    let server = TestServer::start("empty", &[NIRVANA], &[(NIRVANA, &b""[..])])
        .await
        .unwrap();

    let mut client = server.client().await.unwrap();
    let download = client.download("Nirvana", "Lithium").await.unwrap();
    assert_eq!(download.header, FileHeader::found("Nirvana", "Lithium", 0));
    assert!(download.chunks.is_empty());
    assert_eq!(client.list_catalog().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sequential_requests_on_one_connection() {
    let song = patterned(1001);
    let server = TestServer::start("sequential", &[QUEEN, NIRVANA], &[(QUEEN, song.as_slice())])
        .await
        .unwrap();

    let mut client = server.client().await.unwrap();
    assert_eq!(client.list_catalog().await.unwrap().len(), 2);

    let first = client.download("Queen", "Bohemian Rhapsody").await.unwrap();
    let sizes: Vec<usize> = first.chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![1000, 1]);

    assert!(!client.download("Nirvana", "Lithium").await.unwrap().header.found);
    assert_eq!(client.list_catalog().await.unwrap().len(), 2);
    client.close().await.unwrap();
}

/// Catalog edits on disk are visible to the next request.
#[tokio::test]
async fn test_catalog_is_read_per_request() {
    let server = TestServer::start("reread", &[QUEEN], &[]).await.unwrap();
    let mut client = server.client().await.unwrap();
    assert_eq!(client.list_catalog().await.unwrap().len(), 1);

    std::fs::write(server.root.join("record.txt"), format!("{QUEEN}\n{NIRVANA}\n")).unwrap();
    assert_eq!(client.list_catalog().await.unwrap().len(), 2);
}
