//! Drives a world for a fixed number of updates and streams its data.

use anyhow::Result;
use std::io::Write;
use std::time::Instant;

use symbiolab_core::config::AppConfig;
use symbiolab_core::world::World;

pub struct App {
    pub world: World,
    data_interval: u64,
}

impl App {
    /// Builds and seeds a world. A `data_interval` of zero is treated as one.
    pub fn new(config: AppConfig, data_interval: u64) -> Result<Self> {
        let mut world = World::new(config)?;
        world.populate()?;
        Ok(Self {
            world,
            data_interval: data_interval.max(1),
        })
    }

    /// Runs `updates` ticks, writing one JSON checkpoint line to `out` every
    /// data interval and a last one for any leftover ticks.
    pub fn run<W: Write>(&mut self, updates: u64, out: &mut W) -> Result<()> {
        let started = Instant::now();
        let mut pending = false;
        for _ in 0..updates {
            self.world.update();
            pending = true;
            if self.world.tick() % self.data_interval == 0 {
                self.flush(out)?;
                pending = false;
            }
            if self.world.population().num_hosts() == 0 {
                tracing::warn!(tick = self.world.tick(), "host population extinct");
                break;
            }
        }
        if pending {
            self.flush(out)?;
        }

        let phenotypes = self.world.host_phenotypes();
        for (tasks, hosts) in &phenotypes {
            tracing::info!(tasks = %tasks, hosts, "host phenotype");
        }
        tracing::info!(
            ticks = self.world.tick(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            births = self.world.metrics.counter("births"),
            deaths = self.world.metrics.counter("deaths"),
            "run finished"
        );
        Ok(())
    }

    fn flush<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let checkpoint = self.world.checkpoint();
        writeln!(out, "{}", checkpoint.to_json_line()?)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.world.width = 5;
        config.world.height = 5;
        config.world.initial_hosts = 10;
        config.world.initial_symbionts = 5;
        config.world.seed = Some(1);
        config.hardware.thread_count = 1;
        config
    }

    #[test]
    fn test_one_line_per_interval() {
        let mut app = App::new(config(), 4).unwrap();
        let mut out = Vec::new();
        app.run(10, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["from_tick"], 9);
        assert_eq!(last["to_tick"], 10);
        assert_eq!(last["series"]["hosts"].as_array().map(Vec::len), Some(2));
    }
}
