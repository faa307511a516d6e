use charter_ner::{
    BioConfigBuilder, BioConverter, DivByZeroStrat, StatsCollector, StatsConfigBuilder,
    StatsReport,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PAGE_NS: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15";

const REF_INPUT: &str = "\
NA-ACK_14060104_01400_r.r1l23 potwrzenye, genz gest <date> dan tento list od narossenye leta Buozyeho tyssyczyeho cztytrczissteho </date>
NA-ACK_14060104_01400_r.r1l24 <date> sessteho, ten pondyeli przyed Buozym krzysstyenii. </date>";

const HYP_INPUT: &str = "\
NA-ACK_14060104_01400_r.r1l23 potwrzenye, genz gest dan tento list od narossenye leta Buozyeho tyssyczyeho cztytirzissteho </date>
NA-ACK_14060104_01400_r.r1l24 <date> sessteho, ten pondyeli przyed Buozym krzysstyeny. </date>";

#[test]
fn charter_reference_conversion() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("ref_word-test.txt");
    fs::write(&input, REF_INPUT).unwrap();

    let converter = BioConverter::default();
    let written = converter.convert_to_bio(&input, None).unwrap().unwrap();
    assert_eq!(written, dir.path().join("ref_word-test.bio"));

    let expected = "\
potwrzenye O
, O
genz O
gest O
dan B-DAT
tento I-DAT
list I-DAT
od I-DAT
narossenye I-DAT
leta I-DAT
Buozyeho I-DAT
tyssyczyeho I-DAT
cztytrczissteho I-DAT
sessteho B-DAT
, I-DAT
ten I-DAT
pondyeli I-DAT
przyed I-DAT
Buozym I-DAT
krzysstyenii I-DAT
. I-DAT";
    assert_eq!(fs::read_to_string(written).unwrap(), expected);
}

#[test]
fn charter_hypothesis_with_missed_opening_tag() {
    // The model failed to predict the opening of the date on the first line:
    // the whole line stays O and the dangling close is ignored.
    let dir = tempdir().unwrap();
    let input = dir.path().join("hyp_word-test.txt");
    fs::write(&input, HYP_INPUT).unwrap();

    let converter = BioConverter::default();
    let written = converter.convert_to_bio(&input, None).unwrap().unwrap();

    let expected = "\
potwrzenye O
, O
genz O
gest O
dan O
tento O
list O
od O
narossenye O
leta O
Buozyeho O
tyssyczyeho O
cztytirzissteho O
sessteho B-DAT
, I-DAT
ten I-DAT
pondyeli I-DAT
przyed I-DAT
Buozym I-DAT
krzysstyeny I-DAT
. I-DAT";
    assert_eq!(fs::read_to_string(written).unwrap(), expected);
}

#[test]
fn write_ids_prepends_line_identifiers() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tiny.txt");
    fs::write(&input, "doc.1 <persName> Jan </persName>").unwrap();

    let config = BioConfigBuilder::new().write_ids(true).build();
    let converter = BioConverter::new(config);
    let output = dir.path().join("tiny.bio");
    let written = converter
        .convert_to_bio(&input, Some(&output))
        .unwrap()
        .unwrap();
    assert_eq!(fs::read_to_string(written).unwrap(), "doc.1 Jan B-PER");
}

#[test]
fn nothing_to_write_creates_no_file() {
    // Lines made of markers only produce no labeled token.
    let dir = tempdir().unwrap();
    let input = dir.path().join("markers.txt");
    fs::write(&input, "doc.1 <date> </date>").unwrap();

    let converter = BioConverter::default();
    let written = converter.convert_to_bio(&input, None).unwrap();
    assert!(written.is_none());
    assert!(!dir.path().join("markers.bio").exists());
}

#[test]
fn empty_input_file_is_an_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty.txt");
    fs::write(&input, "").unwrap();

    let converter = BioConverter::default();
    assert!(converter.convert_to_bio(&input, None).is_err());
    assert!(!dir.path().join("empty.bio").exists());
}

fn page_file(lines: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (text, custom) in lines {
        body.push_str(&format!(
            "<TextLine id=\"l\" custom=\"{}\"><TextEquiv><Unicode>{}</Unicode></TextEquiv></TextLine>",
            custom, text
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <PcGts xmlns=\"{}\"><Page imageFilename=\"i.jpg\">\
         <TextRegion id=\"r\">{}</TextRegion></Page></PcGts>",
        PAGE_NS, body
    )
}

fn write_corpus_file(root: &Path, lang: &str, doc: &str, content: &str) {
    let dir = root.join(lang).join(doc).join("page");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("0001.xml"), content).unwrap();
}

#[test]
fn statistics_over_a_small_corpus() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write_corpus_file(
        root,
        "czech",
        "doc1",
        &page_file(&[
            (
                "Jan z Prahy psal list",
                "person {offset:0; length:10;} place {offset:2; length:4;}",
            ),
            ("dan tento list", "date {offset:0; length:14; continued;}"),
            ("sessteho ten", "date {offset:0; length:8; continued;}"),
        ]),
    );
    write_corpus_file(
        root,
        "german",
        "doc2",
        &page_file(&[("wir Karl", "person {offset:4; length:10;}")]),
    );
    // Not under a page/ segment: must be ignored.
    let stray = root.join("latin").join("doc3");
    fs::create_dir_all(&stray).unwrap();
    fs::write(stray.join("0001.xml"), page_file(&[("quidam", "person {offset:0; length:6;}")]))
        .unwrap();

    let collector = StatsCollector::default();
    let tally = collector.collect(root).unwrap();
    let report = StatsReport::from_tally(&tally, DivByZeroStrat::ReplaceBy0);

    let expected_meta = "Metric, czech, german, latin
images, 1, 1, 0
lines, 3, 1, 0
words, 10, 2, 0\n";
    assert_eq!(report.metadata.to_string(), expected_meta);

    let expected_totals = "Type, czech, german, latin
PER, 1, 1, 0
LOC, 1, 0, 0
DAT, 1, 0, 0\n";
    assert_eq!(report.totals.to_string(), expected_totals);

    let expected_counts = "Type, Count, czech, german, latin
PER, all, 1, 1, 0
PER, nested, 0, 0, 0
PER, exceed, 0, 0, 0
LOC, all, 1, 0, 0
LOC, nested, 1, 0, 0
LOC, exceed, 0, 0, 0
DAT, all, 1, 0, 0
DAT, nested, 0, 0, 0
DAT, exceed, 0, 0, 0\n";
    assert_eq!(report.counts.to_string(), expected_counts);

    // The german person span (offset 4, length 10) is declared past the end
    // of "wir Karl"; the declared length still feeds the char sum while the
    // token slice is clamped to the text.
    let expected_lengths = "Type, Length, czech, german, latin
PER, avg_char, 10, 10, 0
PER, avg_tokens, 3, 1, 0
LOC, avg_char, 4, 0, 0
LOC, avg_tokens, 3, 0, 0
DAT, avg_char, 14, 0, 0
DAT, avg_tokens, 3, 0, 0\n";
    assert_eq!(report.lengths.to_string(), expected_lengths);
}

#[test]
fn counting_continued_spans_twice_when_requested() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_corpus_file(
        root,
        "czech",
        "doc1",
        &page_file(&[
            ("dan tento list", "date {offset:0; length:14; continued;}"),
            ("sessteho ten", "date {offset:0; length:8; continued;}"),
        ]),
    );

    let collector = StatsCollector::new(StatsConfigBuilder::new().split_lines(true).build());
    let tally = collector.collect(root).unwrap();
    let report = StatsReport::from_tally(&tally, DivByZeroStrat::ReplaceBy0);
    let expected_totals = "Type, czech, german, latin
PER, 0, 0, 0
LOC, 0, 0, 0
DAT, 2, 0, 0\n";
    assert_eq!(report.totals.to_string(), expected_totals);
}

#[test]
fn report_serializes_to_json() {
    let dir = tempdir().unwrap();
    let collector = StatsCollector::default();
    let tally = collector.collect(dir.path()).unwrap();
    let report = StatsReport::from_tally(&tally, DivByZeroStrat::ReplaceByNaN);
    let json = serde_json::to_string_pretty(&report).unwrap();
    assert!(json.contains("avg_char"));
}
