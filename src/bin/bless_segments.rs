use review_topics::SentenceSegmenter;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Deserialize, Serialize)]
struct GoldenSegments {
    id: u32,
    text: String,
    sentences: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = PathBuf::from("tests/golden/segments.jsonl");
    let segmenter = SentenceSegmenter::new();
    let reader = BufReader::new(File::open(&path)?);
    let mut cases = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let mut case: GoldenSegments = serde_json::from_str(&line)?;
        case.sentences = segmenter.split(&case.text);
        cases.push(case);
    }
    let mut writer = BufWriter::new(File::create(&path)?);
    for case in cases {
        serde_json::to_writer(&mut writer, &case)?;
        writeln!(&mut writer)?;
    }
    Ok(())
}
