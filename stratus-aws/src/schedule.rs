//! Schedule builder
//!
//! A single cron rule firing once a day, targeting exactly the query
//! function with no payload. Retry behavior on invocation failure is the
//! platform default and is not overridden here.

use stratus_core::graph::{Graph, NodeId};
use stratus_core::resource::{Descriptor, Value};

use crate::error::BuildError;
use crate::query::QueryFunction;

/// Inputs to the schedule builder
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub minute: i64,
    pub hour: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        // Daily at 04:00
        Self { minute: 0, hour: 4 }
    }
}

/// Handle to the schedule rule
#[derive(Debug, Clone)]
pub struct Schedule {
    pub rule: NodeId,
}

pub fn build(
    graph: &mut Graph,
    query: &QueryFunction,
    config: &ScheduleConfig,
) -> Result<Schedule, BuildError> {
    if !(0..60).contains(&config.minute) || !(0..24).contains(&config.hour) {
        return Err(BuildError::InvalidSchedule {
            hour: config.hour,
            minute: config.minute,
        });
    }

    let rule = graph.add(
        Descriptor::new("schedule_rule", "daily-query")
            .with_attribute(
                "schedule_expression",
                format!("cron({} {} * * ? *)", config.minute, config.hour),
            )
            .with_attribute("minute", config.minute)
            .with_attribute("hour", config.hour)
            .with_attribute(
                "targets",
                Value::list([Value::reference(query.function, "arn")]),
            ),
    );

    Ok(Schedule { rule })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{self, DatabaseConfig};
    use crate::network::{self, NetworkConfig};
    use crate::query;

    fn build_query(graph: &mut Graph) -> QueryFunction {
        let net = network::build(graph, &NetworkConfig::default()).unwrap();
        let db = database::build(graph, &net, &DatabaseConfig::default()).unwrap();
        query::build(graph, &net, &db, None).unwrap()
    }

    #[test]
    fn fires_daily_at_four() {
        let mut graph = Graph::new();
        let q = build_query(&mut graph);
        let schedule = build(&mut graph, &q, &ScheduleConfig::default()).unwrap();

        let descriptor = graph.descriptor(schedule.rule);
        assert_eq!(
            descriptor.attribute("schedule_expression"),
            Some(&Value::String("cron(0 4 * * ? *)".to_string()))
        );
        assert_eq!(descriptor.attribute("hour"), Some(&Value::Int(4)));
        assert_eq!(descriptor.attribute("minute"), Some(&Value::Int(0)));
    }

    #[test]
    fn targets_exactly_the_query_function() {
        let mut graph = Graph::new();
        let q = build_query(&mut graph);
        let schedule = build(&mut graph, &q, &ScheduleConfig::default()).unwrap();

        let descriptor = graph.descriptor(schedule.rule);
        assert_eq!(
            descriptor.attribute("targets"),
            Some(&Value::list([Value::reference(q.function, "arn")]))
        );
        assert_eq!(graph.dependencies_of(schedule.rule), vec![q.function]);
    }

    #[test]
    fn rejects_out_of_range_times() {
        let mut graph = Graph::new();
        let q = build_query(&mut graph);

        let bad_hour = ScheduleConfig { minute: 0, hour: 24 };
        assert!(matches!(
            build(&mut graph, &q, &bad_hour),
            Err(BuildError::InvalidSchedule { hour: 24, .. })
        ));

        let bad_minute = ScheduleConfig { minute: 60, hour: 4 };
        assert!(build(&mut graph, &q, &bad_minute).is_err());
    }
}
