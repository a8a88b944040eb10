use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::exam::session::ExamSession;
use crate::Clock;

/// Background countdown driver for a shared exam session.
///
/// Ticks the session once per second until it finishes; the forced finish at
/// zero happens inside `ExamSession::tick`, so the ticker itself carries no
/// scoring logic. Dropping the ticker stops the task.
pub struct ExamTicker {
    handle: JoinHandle<()>,
}

impl ExamTicker {
    /// Spawns the countdown task over a shared session.
    #[must_use]
    pub fn spawn(session: Arc<Mutex<ExamSession>>, clock: Clock) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately; consume it so the
            // countdown starts a full second after spawn.
            interval.tick().await;

            loop {
                interval.tick().await;

                let Ok(mut session) = session.lock() else {
                    // A poisoned lock means the holder panicked; stop driving.
                    break;
                };
                match session.tick(1, clock.now()) {
                    Ok(Some(_)) => break,
                    Ok(None) if session.is_finished() => break,
                    Ok(None) => {}
                    Err(error) => {
                        log::warn!("countdown tick failed: {error}");
                        break;
                    }
                }
            }
        });

        Self { handle }
    }

    /// Stops the countdown task.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for ExamTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{Category, ExamConfig, Question, QuestionId, UserId};
    use prep_core::time::fixed_clock;

    use crate::exam::plan::ExamPlan;
    use crate::exam::session::ExamStatus;

    fn session(time_limit_secs: u32) -> ExamSession {
        let questions = vec![
            Question::new(
                QuestionId::new("q-1").unwrap(),
                Category::Miscellaneous,
                "Q",
                ["a".into(), "b".into(), "c".into(), "d".into()],
                0,
                None,
            )
            .unwrap(),
        ];
        let config = ExamConfig::new(1, time_limit_secs, 1).unwrap();
        let mut session = ExamSession::new(
            UserId::new("u-1").unwrap(),
            config,
            ExamPlan { questions },
        )
        .unwrap();
        session.begin(fixed_clock().now()).unwrap();
        session
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_forces_finish_when_time_runs_out() {
        let shared = Arc::new(Mutex::new(session(2)));
        let ticker = ExamTicker::spawn(Arc::clone(&shared), fixed_clock());

        // Two virtual seconds exhaust the countdown.
        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;

        let session = shared.lock().unwrap();
        assert_eq!(session.status(), ExamStatus::Finished);
        let result = session.result().unwrap();
        assert_eq!(result.score(), 0);
        assert_eq!(result.time_used_secs(), 2);
        drop(session);

        ticker.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_stops_after_explicit_finish() {
        let shared = Arc::new(Mutex::new(session(600)));
        let _ticker = ExamTicker::spawn(Arc::clone(&shared), fixed_clock());

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        let mut session = shared.lock().unwrap();
        let remaining_at_finish = session.remaining_secs();
        let result = session.finish(fixed_clock().now()).unwrap();
        assert_eq!(result.time_used_secs(), 600 - remaining_at_finish);
        drop(session);

        // Further virtual time must not disturb the stored result.
        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;

        let session = shared.lock().unwrap();
        assert_eq!(session.result().unwrap().time_used_secs(), 600 - remaining_at_finish);
    }
}
