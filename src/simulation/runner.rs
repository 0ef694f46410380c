//! Timer-driven execution
//!
//! Drives `step()` on a tokio interval whose period follows the engine's
//! speed setting. Steps never overlap: each one completes before the next
//! tick is awaited.

use rand::Rng;
use tokio::time::{self, MissedTickBehavior};

use crate::core::error::Result;
use crate::simulation::engine::{SimulationEngine, StepReport};

/// Step the engine once per timer tick until `days` steps have executed or
/// the engine is paused. Returns the reports of the executed steps.
pub async fn run_days<R: Rng + Clone>(engine: &mut SimulationEngine<R>, days: u32) -> Result<Vec<StepReport>> {
    let mut reports = Vec::with_capacity(days as usize);
    let mut ticker = time::interval(engine.step_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        day = engine.day(),
        days,
        speed = engine.speed(),
        "timer started"
    );

    while reports.len() < days as usize {
        ticker.tick().await;
        match engine.step()? {
            Some(report) => reports.push(report),
            None => break,
        }
    }

    tracing::info!(day = engine.day(), executed = reports.len(), "timer stopped");
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    #[tokio::test]
    async fn test_run_days_executes_requested_steps() {
        let mut engine = SimulationEngine::new(SimulationConfig::default()).unwrap();
        engine.set_speed(60);
        engine.set_running(true);

        let reports = run_days(&mut engine, 3).await.unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(engine.day(), 3);
        assert_eq!(reports.last().unwrap().day, 3);
    }

    #[tokio::test]
    async fn test_run_days_stops_when_paused() {
        let mut engine = SimulationEngine::new(SimulationConfig::default()).unwrap();
        let reports = run_days(&mut engine, 10).await.unwrap();
        assert!(reports.is_empty());
        assert_eq!(engine.day(), 0);
    }
}
