//! CSV export of crawl results
use chrono::{Local, TimeZone};

use auction_scout_lib::domain::ListingRecord;
use auction_scout_lib::infrastructure::config::OutputConfig;
use auction_scout_lib::infrastructure::csv_sink::{CsvResultSink, ResultSink};

fn records() -> Vec<ListingRecord> {
    vec![
        ListingRecord::new("https://www.playerauctions.com/offer/1", 1234.5, 4.75).unwrap(),
        ListingRecord::new("https://www.playerauctions.com/offer/2?ref=a,b", 0.99, 0.0).unwrap(),
        ListingRecord::new("https://www.playerauctions.com/offer/3", 2499.99, 5.0).unwrap(),
    ]
}

#[test]
fn every_record_is_exactly_one_row_with_same_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = OutputConfig {
        directory: dir.path().to_path_buf(),
        file_prefix: "pa_accounts".into(),
    };
    let started = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let sink = CsvResultSink::new(&config, started);

    let written = records();
    let path = sink.write(&written).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "pa_accounts_2025-01-02_03-04-05.csv"
    );

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let header: Vec<&str> = reader.headers().unwrap().iter().collect();
    assert_eq!(header, vec!["url", "price", "rating"]);

    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), written.len());
    for (row, record) in rows.iter().zip(&written) {
        assert_eq!(&row[0], record.url());
        assert_eq!(row[1].parse::<f64>().unwrap(), record.price());
        assert_eq!(row[2].parse::<f64>().unwrap(), record.rating());
    }
}

#[test]
fn zero_records_still_produce_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = OutputConfig {
        directory: dir.path().to_path_buf(),
        file_prefix: "empty".into(),
    };
    let path = CsvResultSink::new(&config, Local::now()).write(&[]).unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "url,price,rating\n");
}
