//! Tests for the job-file parser

use ems::command::parser::parse_line;
use ems::command::{Command, CommandReader};
use ems::core::{Coordinate, MAX_RESERVATION_SIZE};

#[test]
fn test_reserve_with_and_without_brackets() {
    let expected = Command::Reserve {
        event_id: 4,
        seats: vec![Coordinate::new(1, 1), Coordinate::new(2, 3)],
    };
    assert_eq!(parse_line("RESERVE 4 [(1,1) (2,3)]"), expected);
    assert_eq!(parse_line("RESERVE 4 (1,1) (2,3)"), expected);
    assert_eq!(parse_line("  RESERVE 4 [ (1, 1)   (2 ,3) ]  "), expected);
}

#[test]
fn test_reserve_rejects_malformed_seats() {
    for line in [
        "RESERVE 4",
        "RESERVE 4 []",
        "RESERVE 4 [(1,1)",
        "RESERVE 4 (1;1)",
        "RESERVE 4 (a,1)",
        "RESERVE x (1,1)",
    ] {
        assert_eq!(parse_line(line), Command::Invalid, "{line}");
    }
}

#[test]
fn test_reserve_size_limit() {
    let seats: Vec<String> = (1..=MAX_RESERVATION_SIZE).map(|c| format!("(1,{c})")).collect();
    let at_limit = format!("RESERVE 1 [{}]", seats.join(" "));
    assert!(matches!(parse_line(&at_limit), Command::Reserve { ref seats, .. } if seats.len() == MAX_RESERVATION_SIZE));

    let over_limit = format!("RESERVE 1 [{} (2,1)]", seats.join(" "));
    assert_eq!(parse_line(&over_limit), Command::Invalid);
}

#[test]
fn test_wait_forms() {
    assert_eq!(
        parse_line("WAIT 500"),
        Command::Wait {
            delay_ms: 500,
            thread_id: None
        }
    );
    assert_eq!(
        parse_line("WAIT 500 2"),
        Command::Wait {
            delay_ms: 500,
            thread_id: Some(2)
        }
    );
    assert_eq!(parse_line("WAIT"), Command::Invalid);
    assert_eq!(parse_line("WAIT 1 2 3"), Command::Invalid);
    assert_eq!(parse_line("WAIT -1"), Command::Invalid);
}

#[test]
fn test_keywords_take_no_extra_arguments() {
    assert_eq!(parse_line("LIST"), Command::List);
    assert_eq!(parse_line("BARRIER"), Command::Barrier);
    assert_eq!(parse_line("HELP"), Command::Help);
    assert_eq!(parse_line("LIST 1"), Command::Invalid);
    assert_eq!(parse_line("BARRIER now"), Command::Invalid);
    assert_eq!(parse_line("SHOW"), Command::Invalid);
    assert_eq!(parse_line("CREATE 1 2"), Command::Invalid);
    assert_eq!(parse_line("list"), Command::Invalid);
}

#[test]
fn test_line_indices_skip_blank_and_comments() {
    let job = "# setup\nCREATE 1 2 2\n\nBOGUS\n   \nSHOW 1\n";
    let lines: Vec<_> = CommandReader::new(job.as_bytes())
        .map(Result::unwrap)
        .filter(|line| line.command != Command::Empty)
        .map(|line| (line.index, line.command.keyword()))
        .collect();
    assert_eq!(lines, vec![(0, "CREATE"), (1, "INVALID"), (2, "SHOW")]);
}

#[test]
fn test_last_line_without_newline() {
    let mut reader = CommandReader::new("LIST\nSHOW 3".as_bytes());
    assert_eq!(reader.next_command().unwrap().unwrap().command, Command::List);
    assert_eq!(
        reader.next_command().unwrap().unwrap().command,
        Command::Show { event_id: 3 }
    );
    assert!(reader.next_command().unwrap().is_none());
}
