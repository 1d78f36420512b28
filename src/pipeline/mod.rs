//! The server-list pipeline.
//!
//! Every recomputation runs the stages in the same order:
//! display-index sort, status filter, tag aggregation over the status-filtered
//! set, tag filter and, when the network view is on, the network sort.
//! Nothing is cached between runs.

pub mod stages;
pub mod tags;

use tracing::debug;

use crate::models::server_record::ServerRecord;
use self::stages::{StatusFilter, filter_by_status, sort_by_display_index, sort_by_network};
use self::tags::{TagSelection, TagSummary, aggregate_tags, filter_by_tag};

/// The filter/sort signals a pipeline run depends on.
#[derive(Debug, Clone, Copy)]
pub struct PipelineInputs<'a> {
    pub status: StatusFilter,
    pub tag: &'a TagSelection,
    pub network_view: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Tag universe and counts for the tag selector.
    pub tags: TagSummary,
    /// The final ordered list.
    pub servers: Vec<ServerRecord>,
}

pub fn run(records: &[ServerRecord], inputs: PipelineInputs<'_>) -> PipelineOutput {
    let sorted = sort_by_display_index(records);
    let by_status = filter_by_status(&sorted, inputs.status);
    let tags = aggregate_tags(&by_status);

    let mut servers = filter_by_tag(&by_status, inputs.tag);
    if inputs.network_view {
        servers = sort_by_network(&servers);
    }

    debug!(
        total = records.len(),
        status = %inputs.status,
        status_filtered = by_status.len(),
        tag = %inputs.tag,
        network_view = inputs.network_view,
        shown = servers.len(),
        "Recomputed server list pipeline."
    );

    PipelineOutput { tags, servers }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(output: &PipelineOutput) -> Vec<u64> {
        output.servers.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_display_index_decides_order() {
        let records = vec![
            ServerRecord::new(2, "db-1").with_display_index(0).with_tag("db"),
            ServerRecord::new(1, "web-1").with_display_index(5).with_tag("web"),
        ];
        let output = run(
            &records,
            PipelineInputs {
                status: StatusFilter::All,
                tag: &TagSelection::All,
                network_view: false,
            },
        );
        assert_eq!(ids(&output), vec![1, 2]);
    }

    #[test]
    fn test_network_view_reorders_by_throughput() {
        let records = vec![
            ServerRecord::new(1, "a").with_online(true).with_net_speeds(25.0, 25.0),
            ServerRecord::new(2, "b").with_online(true).with_net_speeds(120.0, 80.0),
            ServerRecord::new(3, "c"),
        ];
        let inputs = PipelineInputs {
            status: StatusFilter::All,
            tag: &TagSelection::All,
            network_view: true,
        };
        assert_eq!(ids(&run(&records, inputs)), vec![2, 1, 3]);

        let plain = PipelineInputs {
            network_view: false,
            ..inputs
        };
        assert_eq!(ids(&run(&records, plain)), vec![1, 2, 3]);
    }

    #[test]
    fn test_offline_only() {
        let records = vec![
            ServerRecord::new(1, "a").with_online(true),
            ServerRecord::new(2, "b").with_online(true),
            ServerRecord::new(3, "c"),
        ];
        let output = run(
            &records,
            PipelineInputs {
                status: StatusFilter::Offline,
                tag: &TagSelection::All,
                network_view: false,
            },
        );
        assert_eq!(ids(&output), vec![3]);
    }

    #[test]
    fn test_missing_tag_gives_empty_list() {
        let records = vec![
            ServerRecord::new(1, "a").with_tag("web"),
            ServerRecord::new(2, "b"),
        ];
        let gpu = TagSelection::Tag("gpu".into());
        let output = run(
            &records,
            PipelineInputs {
                status: StatusFilter::All,
                tag: &gpu,
                network_view: false,
            },
        );
        assert!(output.servers.is_empty());
        assert!(!output.tags.tags.contains(&gpu));
        assert_eq!(output.tags.tags[0], TagSelection::All);
    }

    #[test]
    fn test_counts_follow_status_not_tag() {
        let records = vec![
            ServerRecord::new(1, "a").with_tag("web").with_online(true),
            ServerRecord::new(2, "b").with_tag("web"),
            ServerRecord::new(3, "c").with_tag("db").with_online(true),
        ];
        let web = TagSelection::Tag("web".into());
        let output = run(
            &records,
            PipelineInputs {
                status: StatusFilter::Online,
                tag: &web,
                network_view: false,
            },
        );
        assert_eq!(ids(&output), vec![1]);
        assert_eq!(output.tags.counts.get("web"), Some(&1));
        assert_eq!(output.tags.counts.get("db"), Some(&1));
    }
}
