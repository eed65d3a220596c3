//! Tests for error types

use ems::core::EmsError;
use ems::scheduler::SchedulerError;

#[test]
fn test_not_initialized_error() {
    let err = EmsError::NotInitialized;
    assert_eq!(format!("{}", err), "EMS state must be initialized");
    assert!(err.is_fatal());
}

#[test]
fn test_not_found_error() {
    let err = EmsError::NotFound(42);
    assert_eq!(format!("{}", err), "event 42 not found");
    assert!(!err.is_fatal());
}

#[test]
fn test_seat_taken_error() {
    let err = EmsError::SeatTaken { row: 1, col: 2 };
    assert_eq!(format!("{}", err), "seat (1,2) already reserved");
    assert!(err.is_conflict());
    assert!(!err.is_invalid());
}

#[test]
fn test_invalid_seat_errors() {
    for err in [
        EmsError::InvalidSeat { row: 0, col: 1 },
        EmsError::DuplicateSeat { row: 1, col: 1 },
        EmsError::EmptyReservation,
    ] {
        assert!(err.is_invalid());
        assert!(!err.is_conflict());
        assert!(!err.is_fatal());
    }
}

#[test]
fn test_invalid_command_error() {
    let err = EmsError::InvalidCommand;
    assert_eq!(format!("{}", err), "invalid command. See HELP for usage");
}

#[test]
fn test_io_error_conversion() {
    let err: EmsError = std::io::Error::other("disk full").into();
    assert_eq!(format!("{}", err), "i/o error: disk full");
}

#[test]
fn test_scheduler_wraps_store_error() {
    let err: SchedulerError = EmsError::AllocFailure(7).into();
    assert_eq!(
        format!("{}", err),
        "job failed: error allocating memory for event 7"
    );
}
