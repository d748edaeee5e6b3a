use super::*;

#[test]
fn test_ordering() {
    assert!(Level::Trace < Level::Debug);
    assert!(Level::Debug < Level::Info);
    assert!(Level::Info < Level::Notice);
    assert!(Level::Notice < Level::Warn);
    assert!(Level::Warn < Level::Error);
    assert!(Level::Error < Level::Fatal);
    assert!(Level::Fatal < Level::Panic);
}

#[test]
fn test_parse_names_and_alias() {
    assert_eq!("TRACE".parse::<Level>().unwrap(), Level::Trace);
    assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
    assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
    assert_eq!("Panic".parse::<Level>().unwrap(), Level::Panic);

    let err = "VERBOSE".parse::<Level>().unwrap_err();
    assert_eq!(err.input, "VERBOSE");
}

#[test]
fn test_display_round_trip() {
    for level in Level::ALL {
        assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
    }
}

#[test]
fn test_try_from_u8() {
    assert_eq!(Level::try_from(0).unwrap(), Level::Trace);
    assert_eq!(Level::try_from(7).unwrap(), Level::Panic);
    assert!(Level::try_from(8).is_err());
}

#[test]
fn test_serde_upper_case() {
    let json = serde_json::to_string(&Level::Notice).unwrap();
    assert_eq!(json, "\"NOTICE\"");
    let back: Level = serde_json::from_str("\"FATAL\"").unwrap();
    assert_eq!(back, Level::Fatal);
}

#[test]
fn test_filter_threshold() {
    let filter = LevelFilter::new(Level::Warn);
    assert!(!filter.enabled(Level::Trace));
    assert!(!filter.enabled(Level::Info));
    assert!(filter.enabled(Level::Warn));
    assert!(filter.enabled(Level::Panic));
}

#[test]
fn test_filter_runtime_change() {
    let filter = LevelFilter::new(Level::Error);
    assert!(!filter.enabled(Level::Debug));

    filter.set_min_level(Level::Trace);
    assert!(filter.enabled(Level::Trace));

    filter.set_enabled(Level::Debug, false);
    assert!(!filter.enabled(Level::Debug));
    assert!(filter.enabled(Level::Trace));

    filter.set_enabled(Level::Debug, true);
    assert!(filter.enabled(Level::Debug));
}

#[test]
fn test_filter_mask_bits() {
    let filter = LevelFilter::new(Level::Fatal);
    assert_eq!(filter.mask(), 0b1100_0000);
    filter.set_mask(0b0000_0100);
    assert!(filter.enabled(Level::Info));
    assert!(!filter.enabled(Level::Fatal));
}
