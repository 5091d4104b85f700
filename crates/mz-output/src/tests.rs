//! Integration tests for mz-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::row::{ConflictRow, EnterRow, TickSummaryRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn enter_row(train: u32, tick: u64) -> EnterRow {
        EnterRow {
            tick,
            train,
            slot:     0,
            x:        -1,
            y:        64,
            z:        3,
            mode:     "full",
            hard:     true,
            distance: 1,
            result:   "occupied",
        }
    }

    fn headers(path: std::path::PathBuf) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("enter_events.csv").exists());
        assert!(dir.path().join("conflicts.csv").exists());
        assert!(dir.path().join("tick_summaries.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(
            headers(dir.path().join("enter_events.csv")),
            ["tick", "train", "slot", "x", "y", "z", "mode", "hard", "distance", "result"]
        );
        assert_eq!(
            headers(dir.path().join("conflicts.csv")),
            ["tick", "train", "crossed", "slot_name", "x", "y", "z"]
        );
        assert_eq!(
            headers(dir.path().join("tick_summaries.csv")),
            ["tick", "running", "moved", "waiting", "finished", "conflicts", "hard_sessions"]
        );
    }

    #[test]
    fn enter_rows_written_in_order() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_enters(&[enter_row(0, 5), enter_row(1, 5), enter_row(2, 6)]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("enter_events.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][1], "0"); // train
        assert_eq!(&rows[2][0], "6"); // tick
        assert_eq!(&rows[0][3], "-1");
        assert_eq!(&rows[0][6], "full");
        assert_eq!(&rows[0][7], "1"); // hard
        assert_eq!(&rows[0][9], "occupied");
    }

    #[test]
    fn conflict_row_keeps_slot_name() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_conflict(&ConflictRow {
            tick:      9,
            train:     2,
            crossed:   1,
            slot_name: "north, junction".to_owned(),
            x:         0,
            y:         0,
            z:         0,
        })
        .unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("conflicts.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][3], "north, junction", "quoted, not split");
    }

    #[test]
    fn tick_summary_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&TickSummaryRow {
            tick:          3,
            running:       2,
            moved:         1,
            waiting:       1,
            finished:      0,
            conflicts:     0,
            hard_sessions: 1,
        })
        .unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3");
        assert_eq!(&rows[0][3], "1"); // waiting
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_batch_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_enters(&[]).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tmp();
        assert!(CsvWriter::new(&dir.path().join("nope")).is_err());
    }
}

#[cfg(test)]
mod observer_tests {
    use tempfile::TempDir;

    use mz_core::{AgentId, LockMode, Segment};
    use mz_sim::{Sim, SimBuilder, SimConfig, Train};
    use mz_zone::ZoneDecl;

    use crate::csv::CsvWriter;
    use crate::observer::SimOutputObserver;

    fn crossing(total_ticks: u64) -> Sim {
        let east = (-10..=10).map(|x| Segment::new(x, 0, 0)).collect();
        let south = (-10..=10).map(|z| Segment::new(0, 0, z)).collect();
        let config = SimConfig { total_ticks, ..SimConfig::default() };
        SimBuilder::new(config)
            .zone(ZoneDecl::new(Segment::new(-1, 0, -1), Segment::new(1, 0, 1), LockMode::Full))
            .trains([
                Train::new(AgentId(0), east).length(2),
                Train::new(AgentId(1), south).length(2),
            ])
            .build()
            .unwrap()
    }

    fn records(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn integration_csv() {
        let mut sim = crossing(30);
        let dir = tempfile::tempdir().unwrap();
        let mut obs = SimOutputObserver::new(CsvWriter::new(dir.path()).unwrap());
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        assert_eq!(records(&dir, "tick_summaries.csv").len(), 30, "one row per tick");
        assert!(records(&dir, "conflicts.csv").is_empty());

        let enters = records(&dir, "enter_events.csv");
        assert!(enters.iter().any(|r| &r[1] == "1" && &r[9] == "occupied"));
        assert!(enters.iter().any(|r| &r[7] == "0" && &r[9] == "success"));
        // Rows arrive in tick order.
        let ticks: Vec<u64> = enters.iter().map(|r| r[0].parse().unwrap()).collect();
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn hard_only_skips_soft_successes() {
        let mut sim = crossing(30);
        let dir = tempfile::tempdir().unwrap();
        let mut obs = SimOutputObserver::new(CsvWriter::new(dir.path()).unwrap()).hard_only();
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let enters = records(&dir, "enter_events.csv");
        assert!(!enters.is_empty());
        assert!(enters.iter().all(|r| &r[7] == "1" || &r[9] != "success"));
        // The second train's failed soft enters are kept.
        assert!(enters.iter().any(|r| &r[7] == "0" && &r[9] == "occupied"));
    }
}
