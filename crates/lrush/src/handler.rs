//! Command handler for the shell

use std::collections::BTreeMap;

use lrucache::{KeyStatistics, LruCache, Statistics, StatisticsSnapshot};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::reply::{tokenize, Reply};

/// JSON body of `STATS JSON`
#[derive(Debug, Serialize)]
struct StatsReport {
    #[serde(flatten)]
    totals: StatisticsSnapshot,
    keys: BTreeMap<String, KeyStatistics>,
}

pub struct CommandHandler {
    cache: LruCache<String, String>,
}

impl CommandHandler {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Attach a fresh statistics sink tracking `keys` individually
    pub fn monitor<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.cache
            .monitor(std::sync::Arc::new(Statistics::with_keys(keys)));
    }

    pub fn handle(&mut self, line: &str) -> Reply {
        let tokens = match tokenize(line) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Parse error: {}", e);
                return Reply::error(e);
            }
        };

        let Some((command, args)) = tokens.split_first() else {
            return Reply::error("empty command");
        };
        let command = command.to_uppercase();
        debug!(command = %command, args = args.len(), "handling command");

        match command.as_str() {
            "SET" => self.handle_set(args),
            "GET" => self.handle_get(args),
            "HAS" => self.handle_has(args),
            "DEL" => self.handle_del(args),
            "CLEAR" => self.handle_clear(args),
            "SHRINK" => self.handle_shrink(args),
            "CAPACITY" => self.handle_capacity(args),
            "LEN" => self.handle_len(args),
            "KEYS" => self.handle_keys(args),
            "ORDER" => self.handle_order(args),
            "MONITOR" => self.handle_monitor(args),
            "UNMONITOR" => self.handle_unmonitor(args),
            "STATS" => self.handle_stats(args),
            "QUIT" | "EXIT" => Reply::Quit,
            _ => Reply::error(format!("unknown command '{}'", command)),
        }
    }

    fn handle_set(&mut self, args: &[String]) -> Reply {
        let [key, value] = args else {
            return wrong_arity("set");
        };

        if self.cache.insert(key.clone(), value.clone()).was_inserted() {
            Reply::Status("inserted".to_string())
        } else {
            Reply::Status("replaced".to_string())
        }
    }

    fn handle_get(&mut self, args: &[String]) -> Reply {
        let [key] = args else {
            return wrong_arity("get");
        };
        Reply::Bulk(self.cache.lookup(key.as_str()).ok().cloned())
    }

    fn handle_has(&mut self, args: &[String]) -> Reply {
        let [key] = args else {
            return wrong_arity("has");
        };
        Reply::Integer(usize::from(self.cache.contains(key.as_str())))
    }

    fn handle_del(&mut self, args: &[String]) -> Reply {
        if args.is_empty() {
            return wrong_arity("del");
        }

        let deleted = args
            .iter()
            .filter(|key| self.cache.erase(key.as_str()))
            .count();
        Reply::Integer(deleted)
    }

    fn handle_clear(&mut self, args: &[String]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("clear");
        }
        self.cache.clear();
        Reply::ok()
    }

    fn handle_shrink(&mut self, args: &[String]) -> Reply {
        let [size] = args else {
            return wrong_arity("shrink");
        };
        match parse_size(size) {
            Ok(size) => {
                self.cache.shrink(size);
                Reply::ok()
            }
            Err(reply) => reply,
        }
    }

    fn handle_capacity(&mut self, args: &[String]) -> Reply {
        match args {
            [] => Reply::Integer(self.cache.capacity()),
            [capacity] => match parse_size(capacity) {
                Ok(capacity) => {
                    info!("Cache capacity: {}", capacity);
                    self.cache.set_capacity(capacity);
                    Reply::ok()
                }
                Err(reply) => reply,
            },
            _ => wrong_arity("capacity"),
        }
    }

    fn handle_len(&mut self, args: &[String]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("len");
        }
        Reply::Integer(self.cache.len())
    }

    fn handle_keys(&mut self, args: &[String]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("keys");
        }
        Reply::List(self.cache.keys().cloned().collect())
    }

    fn handle_order(&mut self, args: &[String]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("order");
        }
        Reply::List(self.cache.ordered_iter().map(|(key, _)| key.clone()).collect())
    }

    /// `MONITOR` attaches a sink if none is attached; keys given are tracked
    /// individually, on the new or the existing sink.
    fn handle_monitor(&mut self, args: &[String]) -> Reply {
        match self.cache.statistics() {
            Ok(stats) => {
                for key in args {
                    stats.monitor_key(key.clone());
                }
            }
            Err(_) => self.monitor(args.iter().cloned()),
        }
        Reply::ok()
    }

    fn handle_unmonitor(&mut self, args: &[String]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("unmonitor");
        }
        self.cache.stop_monitoring();
        Reply::ok()
    }

    fn handle_stats(&mut self, args: &[String]) -> Reply {
        let json = match args {
            [] => false,
            [format] if format.eq_ignore_ascii_case("json") => true,
            [format] => return Reply::error(format!("unknown stats format '{}'", format)),
            _ => return wrong_arity("stats"),
        };

        let stats = match self.cache.statistics() {
            Ok(stats) => stats,
            Err(e) => return Reply::error(e),
        };

        let report = StatsReport {
            totals: stats.snapshot(),
            keys: stats.per_key().into_iter().collect(),
        };

        if json {
            match serde_json::to_string(&report) {
                Ok(body) => Reply::Text(body),
                Err(e) => Reply::error(e),
            }
        } else {
            Reply::Text(render_stats(&report))
        }
    }
}

fn render_stats(report: &StatsReport) -> String {
    let mut lines = vec![
        format!("total_accesses:{}", report.totals.total_accesses),
        format!("total_hits:{}", report.totals.total_hits),
        format!("total_misses:{}", report.totals.total_misses),
        format!("hit_rate:{:.2}", report.totals.hit_rate),
    ];
    for (key, stats) in &report.keys {
        lines.push(format!("key:{} hits:{} misses:{}", key, stats.hits, stats.misses));
    }
    lines.join("\n")
}

fn wrong_arity(command: &str) -> Reply {
    Reply::error(format!(
        "wrong number of arguments for '{}' command",
        command
    ))
}

fn parse_size(arg: &str) -> Result<usize, Reply> {
    arg.parse()
        .map_err(|_| Reply::error("value is not a non-negative integer"))
}
