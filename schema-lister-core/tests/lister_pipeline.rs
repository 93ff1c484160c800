//! Pipeline tests driven by the scripted in-memory driver.
//!
//! These cover the observable report, the stage prefixes of fatal errors and
//! the order in which handles are released on every exit path.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use schema_lister_core::driver::memory::{DriverEvent, MemoryDriver, MemoryRow, Resource};
use schema_lister_core::{Configuration, ListerError, SCHEMA_QUERY, list_schemas};

const SENSITIVE_PASSWORD: &str = "super_secret_password_123";

fn run_config() -> Configuration {
    Configuration::default()
        .with_server("db1")
        .with_user("alice")
        .with_password(SENSITIVE_PASSWORD)
        .with_port(5555)
}

/// Report lines between the banners, with the blank separator lines removed
fn body_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("Starting program") && *line != "Ending program")
        .collect()
}

fn closes(driver: &MemoryDriver) -> Vec<Resource> {
    driver
        .events()
        .into_iter()
        .filter_map(|event| match event {
            DriverEvent::Closed(resource) => Some(resource),
            _ => None,
        })
        .collect()
}

mod success {
    use super::*;

    #[tokio::test]
    async fn test_rows_print_in_server_order() {
        let driver = MemoryDriver::new().with_text_rows(["dbo", "sys", "guest"]);
        let mut out = Vec::new();

        let report = list_schemas(&run_config(), &driver, &mut out)
            .await
            .expect("listing should succeed");

        let output = String::from_utf8(out).unwrap();
        assert_eq!(report.schemas_printed, 3);
        assert_eq!(body_lines(&output), vec!["dbo", "sys", "guest"]);
        assert!(output.ends_with("\nEnding program\n"));
    }

    #[tokio::test]
    async fn test_zero_rows_prints_banners_only() {
        let driver = MemoryDriver::new();
        let mut out = Vec::new();

        let report = list_schemas(&run_config(), &driver, &mut out)
            .await
            .expect("zero rows is not an error");

        assert_eq!(report.schemas_printed, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Starting program to print all MSSQL schemas:\n\n\nEnding program\n"
        );
    }

    #[tokio::test]
    async fn test_descriptor_and_query_reach_driver() {
        let driver = MemoryDriver::new().with_text_rows(["dbo"]);
        let mut out = Vec::new();

        list_schemas(&run_config(), &driver, &mut out).await.unwrap();

        let events = driver.events();
        assert_eq!(
            events[0],
            DriverEvent::Opened {
                descriptor: format!(
                    "server=db1;user id=alice;password={SENSITIVE_PASSWORD};port=5555"
                )
            }
        );
        assert_eq!(
            events[1],
            DriverEvent::Prepared {
                text: SCHEMA_QUERY.to_string()
            }
        );
        assert_eq!(events[2], DriverEvent::Executed);
    }

    #[tokio::test]
    async fn test_resources_released_in_reverse_order() {
        let driver = MemoryDriver::new().with_text_rows(["dbo", "sys"]);
        let mut out = Vec::new();

        list_schemas(&run_config(), &driver, &mut out).await.unwrap();

        assert_eq!(
            closes(&driver),
            vec![Resource::Cursor, Resource::Statement, Resource::Connection]
        );
    }
}

mod debug_output {
    use super::*;

    #[tokio::test]
    async fn test_no_configuration_values_without_debug() {
        let driver = MemoryDriver::new().with_text_rows(["dbo"]);
        let mut out = Vec::new();

        list_schemas(&run_config(), &driver, &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(
            !output.contains(SENSITIVE_PASSWORD),
            "Password leaked in output: {output}"
        );
        assert!(!output.contains("db1"));
        assert!(!output.contains("alice"));
        assert!(!output.contains("5555"));
        assert!(!output.contains("connString"));
    }

    #[tokio::test]
    async fn test_debug_block_lists_values_and_descriptor() {
        let config = run_config().with_debug(true);
        let driver = MemoryDriver::new().with_text_rows(["dbo"]);
        let mut out = Vec::new();

        list_schemas(&config, &driver, &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        let debug_block: Vec<String> = lines[2..8].iter().map(ToString::to_string).collect();
        assert_eq!(
            debug_block,
            vec![
                " debug:true".to_string(),
                format!(" password:{SENSITIVE_PASSWORD}"),
                " port:5555".to_string(),
                " server:db1".to_string(),
                " user:alice".to_string(),
                format!(
                    " connString:server=db1;user id=alice;password={SENSITIVE_PASSWORD};port=5555"
                ),
            ]
        );
        // Schema rows follow the debug block
        assert_eq!(lines[8], "dbo");
    }

    #[tokio::test]
    async fn test_debug_block_printed_before_failed_connect() {
        let config = run_config().with_debug(true);
        let driver = MemoryDriver::new().fail_open("network unreachable");
        let mut out = Vec::new();

        let error = list_schemas(&config, &driver, &mut out).await.unwrap_err();

        let output = String::from_utf8(out).unwrap();
        assert!(matches!(error, ListerError::Connection(_)));
        assert!(output.contains(
            "connString:server=db1;user id=alice;password=super_secret_password_123;port=5555"
        ));
        assert!(!output.contains("Ending program"));
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_open_failure_stops_before_prepare() {
        let driver = MemoryDriver::new()
            .with_text_rows(["dbo"])
            .fail_open("login failed for user 'alice'");
        let mut out = Vec::new();

        let error = list_schemas(&run_config(), &driver, &mut out)
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Open connection failed: login failed for user 'alice'"
        );
        assert_eq!(error.stage(), "connect");

        let output = String::from_utf8(out).unwrap();
        assert!(body_lines(&output).is_empty());
        assert!(!output.contains("Ending program"));

        // Nothing was acquired, so nothing is released
        assert!(driver.events().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_failure_releases_connection() {
        let driver = MemoryDriver::new().fail_prepare("invalid object name");
        let mut out = Vec::new();

        let error = list_schemas(&run_config(), &driver, &mut out)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Prepare failed: invalid object name");
        assert_eq!(closes(&driver), vec![Resource::Connection]);
    }

    #[tokio::test]
    async fn test_query_failure_releases_statement_then_connection() {
        let driver = MemoryDriver::new().fail_execute("permission denied");
        let mut out = Vec::new();

        let error = list_schemas(&run_config(), &driver, &mut out)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Query failed: permission denied");
        assert_eq!(
            closes(&driver),
            vec![Resource::Statement, Resource::Connection]
        );
    }

    #[tokio::test]
    async fn test_scan_failure_keeps_printed_rows() {
        let driver = MemoryDriver::new().with_rows([
            MemoryRow::Text("dbo".to_string()),
            MemoryRow::Null,
            MemoryRow::Text("guest".to_string()),
        ]);
        let mut out = Vec::new();

        let error = list_schemas(&run_config(), &driver, &mut out)
            .await
            .unwrap_err();

        assert!(error.to_string().starts_with("Row scan failed: "));
        assert!(error.to_string().contains("NULL"));

        let output = String::from_utf8(out).unwrap();
        assert_eq!(body_lines(&output), vec!["dbo"]);
        assert!(!output.contains("Ending program"));

        assert_eq!(
            closes(&driver),
            vec![Resource::Cursor, Resource::Statement, Resource::Connection]
        );
    }

    #[tokio::test]
    async fn test_non_text_column_is_scan_failure() {
        let driver = MemoryDriver::new().with_rows([MemoryRow::Integer(1)]);
        let mut out = Vec::new();

        let error = list_schemas(&run_config(), &driver, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(error, ListerError::Scan(_)));
    }

    #[tokio::test]
    async fn test_cursor_error_mid_stream_is_scan_failure() {
        let driver = MemoryDriver::new().with_rows([
            MemoryRow::Text("dbo".to_string()),
            MemoryRow::Error("connection reset by peer".to_string()),
        ]);
        let mut out = Vec::new();

        let error = list_schemas(&run_config(), &driver, &mut out)
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Row scan failed: connection reset by peer"
        );
        assert_eq!(error.driver_error().unwrap().message(), "connection reset by peer");
    }

    #[tokio::test]
    async fn test_output_failure_is_reported() {
        struct BrokenPipe;

        impl std::io::Write for BrokenPipe {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "broken pipe",
                ))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let driver = MemoryDriver::new().with_text_rows(["dbo"]);
        let error = list_schemas(&run_config(), &driver, &mut BrokenPipe)
            .await
            .unwrap_err();

        assert_eq!(error.stage(), "output");
        assert!(driver.events().is_empty());
    }
}
