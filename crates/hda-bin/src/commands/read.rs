// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `read` command.
//!
//! Records `--samples` simulated values per variable, then reads one node
//! back page by page, following continuation points until none is returned.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use hda_archive::{
    HistoryReadContext, HistoryReadDetails, HistoryReadOptions, HistoryServer,
    ReadRawModifiedDetails,
};
use hda_config::HdaConfig;
use hda_core::{DataValue, HdaError, NodeId, SessionId, StatusCode};

use crate::cli::{OutputFormat, ReadArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::RuntimeBuilder;

/// Executes the `read` command.
pub fn read(config: HdaConfig, args: ReadArgs) -> BinResult<()> {
    let mut runtime = RuntimeBuilder::new().config(config).build()?;

    let node_id = match &args.node {
        Some(text) => text.parse::<NodeId>().map_err(HdaError::from)?,
        None => runtime
            .variables()
            .next()
            .map(|v| v.node_id().clone())
            .ok_or_else(|| BinError::config("no variables configured"))?,
    };

    let interval = runtime.config().simulation.interval;
    let start = Utc::now();
    let written = runtime.record_samples(args.samples, start, interval)?;
    debug!(written, "Recorded simulated samples");

    let (earliest, latest) = read_window(start, interval, args.samples)?;
    let details = if args.reverse {
        ReadRawModifiedDetails::between(latest, earliest)
    } else {
        ReadRawModifiedDetails::between(earliest, latest)
    }
    .with_num_values(args.page_size);

    let server = runtime.server();
    let (status, pages) = read_pages(server, &node_id, &HistoryReadDetails::from(details));

    match args.format {
        OutputFormat::Text => print_text(&node_id, status, &pages),
        OutputFormat::Json => print_json(&node_id, status, &pages)?,
    }

    server.dispose();

    if status.is_bad() {
        return Err(BinError::runtime(format!("history read of {} failed: {}", node_id, status)));
    }
    Ok(())
}

/// Time range covering `samples` values from `start`, padded by a day on
/// both sides.
fn read_window(
    start: DateTime<Utc>,
    interval: Duration,
    samples: usize,
) -> BinResult<(DateTime<Utc>, DateTime<Utc>)> {
    let count = u32::try_from(samples)
        .map_err(|_| BinError::config(format!("--samples {} is too large", samples)))?;
    let out_of_range = || BinError::config("sample span is out of range");

    let span = interval
        .checked_mul(count)
        .and_then(|span| chrono::Duration::from_std(span).ok())
        .ok_or_else(out_of_range)?;
    let margin = chrono::Duration::days(1);

    let earliest = start.checked_sub_signed(margin).ok_or_else(out_of_range)?;
    let latest = start
        .checked_add_signed(span)
        .and_then(|end| end.checked_add_signed(margin))
        .ok_or_else(out_of_range)?;
    Ok((earliest, latest))
}

/// Reads every page for `node_id` in a fresh session.
///
/// Returns the status of the last request and the pages read before it.
pub fn read_pages(
    server: &HistoryServer,
    node_id: &NodeId,
    details: &HistoryReadDetails,
) -> (StatusCode, Vec<Vec<DataValue>>) {
    let ctx = HistoryReadContext::new(SessionId::new());
    let mut options = HistoryReadOptions::default();
    let mut pages = Vec::new();

    let status = loop {
        let result = server.history_read(&ctx, node_id, details, None, None, &options);
        if result.status_code.is_bad() {
            break result.status_code;
        }
        let status = result.status_code;
        pages.push(result.history_data.data_values);
        match result.continuation_point {
            Some(token) => options = HistoryReadOptions::resume(token),
            None => break status,
        }
    };

    server.close_session(ctx.session_id);
    (status, pages)
}

fn print_text(node_id: &NodeId, status: StatusCode, pages: &[Vec<DataValue>]) {
    let total: usize = pages.iter().map(Vec::len).sum();
    println!("History of {} ({} values, {} pages): {}", node_id, total, pages.len(), status);

    for (index, page) in pages.iter().enumerate() {
        println!();
        println!("Page {} ({} values)", index + 1, page.len());
        for value in page {
            println!(
                "  {}  {:>12}  {}",
                format_timestamp(value.source_timestamp),
                value.value,
                value.status
            );
        }
    }
}

fn print_json(node_id: &NodeId, status: StatusCode, pages: &[Vec<DataValue>]) -> BinResult<()> {
    let pages: Vec<_> = pages
        .iter()
        .map(|page| {
            page.iter()
                .map(|value| {
                    json!({
                        "source_timestamp": format_timestamp(value.source_timestamp),
                        "value": value.value.to_json(),
                        "status": value.status.to_string(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let output = json!({
        "node_id": node_id.to_string(),
        "status": status.to_string(),
        "total": pages.iter().map(Vec::len).sum::<usize>(),
        "pages": pages,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hda_archive::HistoryServerConfig;
    use hda_core::Variable;
    use std::sync::Arc;

    fn server_with_values(count: i64) -> (HistoryServer, NodeId, DateTime<Utc>) {
        let server = HistoryServer::new(HistoryServerConfig::for_testing());
        let node_id = NodeId::numeric(2, 42);
        let variable = Arc::new(Variable::new(node_id.clone(), "Flow"));
        server.install(&variable, None).unwrap();

        let t0 = Utc::now();
        for i in 0..count {
            variable.set_value(DataValue::good(i as f64, t0 + chrono::Duration::seconds(i)));
        }
        (server, node_id, t0)
    }

    #[test]
    fn test_read_pages_follows_continuation_points() {
        let (server, node_id, t0) = server_with_values(7);
        let details = ReadRawModifiedDetails::between(
            t0 - chrono::Duration::hours(1),
            t0 + chrono::Duration::hours(1),
        )
        .with_num_values(3);

        let (status, pages) = read_pages(&server, &node_id, &HistoryReadDetails::from(details));

        assert!(status.is_good());
        let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(server.continuation_points().len(), 0);
    }

    #[test]
    fn test_read_window_pads_sample_span() {
        let t0 = Utc::now();
        let (earliest, latest) = read_window(t0, Duration::from_secs(10), 6).unwrap();

        assert_eq!(earliest, t0 - chrono::Duration::days(1));
        assert_eq!(latest, t0 + chrono::Duration::seconds(60) + chrono::Duration::days(1));
    }

    #[test]
    fn test_read_window_rejects_oversized_span() {
        let t0 = Utc::now();

        let result = read_window(t0, Duration::from_secs(1), u32::MAX as usize + 1);
        assert!(matches!(result, Err(BinError::Configuration(_))));

        let result = read_window(t0, Duration::from_secs(u64::MAX / 2), 4);
        assert!(matches!(result, Err(BinError::Configuration(_))));

        let result = read_window(DateTime::<Utc>::MAX_UTC, Duration::from_secs(1), 1);
        assert!(matches!(result, Err(BinError::Configuration(_))));
    }

    #[test]
    fn test_read_pages_unknown_node() {
        let (server, _, t0) = server_with_values(2);
        let details = ReadRawModifiedDetails::starting_at(t0).with_num_values(1);

        let (status, pages) = read_pages(
            &server,
            &NodeId::numeric(2, 999),
            &HistoryReadDetails::from(details),
        );

        assert_eq!(status, StatusCode::BAD_NODE_ID_UNKNOWN);
        assert!(pages.is_empty());
    }

    #[test]
    fn test_read_command_with_default_config() {
        let args = ReadArgs {
            samples: 6,
            page_size: 4,
            ..ReadArgs::default()
        };
        assert!(read(HdaConfig::default(), args).is_ok());
    }

    #[test]
    fn test_read_command_rejects_bad_node() {
        let args = ReadArgs {
            node: Some("ns=2;i=404".to_string()),
            samples: 2,
            ..ReadArgs::default()
        };
        assert!(matches!(
            read(HdaConfig::default(), args),
            Err(BinError::Runtime(_))
        ));
    }
}
