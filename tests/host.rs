#![cfg(feature = "std")]

use freewheel::{host::Session, sans::Options};

const PATH: &str = "fixtures/synthetic-ride.fit";

#[test]
fn session_over_worker_sized_chunks() {
    freewheel::host::init();

    let data = std::fs::read(PATH).unwrap();
    let mut session = Session::new();
    let mut items = vec![];

    let per_chunk: Vec<usize> = data
        .chunks(512)
        .map(|chunk| session.process(chunk, |i| items.push(i)))
        .collect();
    assert_eq!(per_chunk.len(), 2);
    assert_eq!(session.finish(|i| items.push(i)), 0);

    assert_eq!(per_chunk.iter().sum::<usize>(), 41);
    assert_eq!(session.records(), 41);
    assert_eq!(items.len(), 41);
    assert!(items.iter().all(Result::is_ok));
}

#[test]
fn session_reports_truncation_on_finish() {
    let data = std::fs::read(PATH).unwrap();
    let mut session = Session::with_options(Options::new().with_max_buffered(4096));
    let mut items = vec![];

    session.process(&data[..100], |i| items.push(i));
    let before = items.len();
    session.finish(|i| items.push(i));

    assert_eq!(items.len(), before + 1);
    assert!(items.last().unwrap().as_ref().unwrap_err().is_fatal());
}

#[cfg(feature = "serde")]
#[test]
fn session_emits_json() {
    let data = std::fs::read(PATH).unwrap();
    let mut session = Session::new();
    let mut documents = vec![];

    session.process_json(&data, |json| documents.push(json));
    session.finish_json(|json| documents.push(json));
    assert_eq!(documents.len(), 41);

    let file_id: serde_json::Value = serde_json::from_str(&documents[0]).unwrap();
    assert_eq!(file_id["global"], 0);
    assert_eq!(file_id["fields"][0]["number"], 0);
    assert_eq!(file_id["fields"][0]["value"], 4);

    let sport: serde_json::Value = serde_json::from_str(&documents[3]).unwrap();
    assert_eq!(sport["fields"][1]["value"], "Road Cycling");
}

#[cfg(feature = "serde")]
#[test]
fn json_conditions() {
    let data = std::fs::read(PATH).unwrap();
    let mut session = Session::new();
    let mut documents = vec![];

    session.process_json(&data[..data.len() - 1], |json| documents.push(json));
    session.finish_json(|json| documents.push(json));

    let last: serde_json::Value = serde_json::from_str(documents.last().unwrap()).unwrap();
    assert_eq!(last["fatal"], true);
    assert!(last["error"]["TruncatedInput"].is_object());
}
