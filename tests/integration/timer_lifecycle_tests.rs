/*!
 * Tests for the timed auto-advance cadence: arming, pausing, resuming and
 * cancellation across the reader lifecycle
 */

use std::time::Duration;

use anyhow::Result;
use pagereader::reader::{ReaderEvent, ReaderHooks};
use tokio::task::LocalSet;
use tokio::time::Instant;

use crate::common::mocks::RecordingShell;
use crate::common::{self, expect_no_event, next_event, start_reader, test_config};

const URL: &str = "https://example.com/article";

fn sentence(text: &str) -> ReaderEvent {
    ReaderEvent::SentenceActivated {
        notification: "SENTENCE".to_string(),
        text: text.to_string(),
    }
}

/// Test that a timed run walks every sentence and closes on its own
#[tokio::test(start_paused = true)]
async fn test_timed_reading_withTwoSentences_shouldAutoAdvanceToClose() -> Result<()> {
    let local = LocalSet::new();
    local
        .run_until(async {
            let proxy = common::mocks::MockProxy::new().with_page(URL, common::TWO_SENTENCE_PAGE);
            let (shell, _state) = RecordingShell::new();
            let (handle, mut events, task) =
                start_reader(test_config(500), ReaderHooks::default(), proxy, shell);

            handle.load(URL)?;
            assert_eq!(
                next_event(&mut events).await,
                ReaderEvent::ReaderOpened {
                    original_url: URL.to_string(),
                    sentence_count: 2,
                }
            );

            let started = Instant::now();
            assert_eq!(next_event(&mut events).await, sentence("One."));
            assert_eq!(next_event(&mut events).await, sentence(" Two."));
            assert_eq!(next_event(&mut events).await, ReaderEvent::ReaderClosed);

            // One cadence step per sentence after the first activation.
            assert!(started.elapsed() >= Duration::from_millis(1000));

            handle.shutdown()?;
            task.await?;
            Ok(())
        })
        .await
}

/// Test that pausing holds the cadence and resume replays the current
/// sentence before continuing
#[tokio::test(start_paused = true)]
async fn test_timed_reading_withPauseAndResume_shouldReplayCurrentSentence() -> Result<()> {
    let local = LocalSet::new();
    local
        .run_until(async {
            let proxy = common::mocks::MockProxy::new().with_page(URL, common::THREE_SENTENCE_PAGE);
            let (shell, _state) = RecordingShell::new();
            let (handle, mut events, task) =
                start_reader(test_config(500), ReaderHooks::default(), proxy, shell);

            handle.load(URL)?;
            next_event(&mut events).await; // opened
            assert_eq!(next_event(&mut events).await, sentence("Hello world."));

            handle.pause()?;
            expect_no_event(&mut events, Duration::from_secs(5)).await;

            // Pausing twice changes nothing.
            handle.pause()?;
            expect_no_event(&mut events, Duration::from_secs(5)).await;

            handle.resume()?;
            assert_eq!(next_event(&mut events).await, sentence("Hello world."));
            assert_eq!(next_event(&mut events).await, sentence(" How are you?"));

            handle.shutdown()?;
            task.await?;
            Ok(())
        })
        .await
}

/// Test that an explicit next between ticks restarts the cadence from the
/// new sentence instead of stacking timers
#[tokio::test(start_paused = true)]
async fn test_timed_reading_withManualNext_shouldRestartCadence() -> Result<()> {
    let local = LocalSet::new();
    local
        .run_until(async {
            let proxy = common::mocks::MockProxy::new().with_page(URL, common::THREE_SENTENCE_PAGE);
            let (shell, _state) = RecordingShell::new();
            let (handle, mut events, task) =
                start_reader(test_config(500), ReaderHooks::default(), proxy, shell);

            handle.load(URL)?;
            next_event(&mut events).await; // opened
            assert_eq!(next_event(&mut events).await, sentence("Hello world."));

            // Jump ahead before the timer fires.
            handle.next()?;
            assert_eq!(next_event(&mut events).await, sentence(" How are you?"));

            // Only the re-armed timer ticks: exactly one activation follows,
            // then exhaustion closes the reader.
            assert_eq!(next_event(&mut events).await, sentence(" Fine!"));
            assert_eq!(next_event(&mut events).await, ReaderEvent::ReaderClosed);

            handle.shutdown()?;
            task.await?;
            Ok(())
        })
        .await
}

/// Test that going back replays earlier sentences on the same cadence
#[tokio::test(start_paused = true)]
async fn test_timed_reading_withPrevious_shouldReplayEarlierSentence() -> Result<()> {
    let local = LocalSet::new();
    local
        .run_until(async {
            let proxy = common::mocks::MockProxy::new().with_page(URL, common::THREE_SENTENCE_PAGE);
            let (shell, _state) = RecordingShell::new();
            let (handle, mut events, task) =
                start_reader(test_config(500), ReaderHooks::default(), proxy, shell);

            handle.load(URL)?;
            next_event(&mut events).await; // opened
            assert_eq!(next_event(&mut events).await, sentence("Hello world."));
            assert_eq!(next_event(&mut events).await, sentence(" How are you?"));

            handle.previous()?;
            assert_eq!(next_event(&mut events).await, sentence("Hello world."));
            assert_eq!(next_event(&mut events).await, sentence(" How are you?"));

            handle.shutdown()?;
            task.await?;
            Ok(())
        })
        .await
}

/// Test that stopping mid-read cancels the pending timer
#[tokio::test(start_paused = true)]
async fn test_timed_reading_withStop_shouldCancelPendingTimer() -> Result<()> {
    let local = LocalSet::new();
    local
        .run_until(async {
            let proxy = common::mocks::MockProxy::new().with_page(URL, common::THREE_SENTENCE_PAGE);
            let (shell, _state) = RecordingShell::new();
            let (handle, mut events, task) =
                start_reader(test_config(500), ReaderHooks::default(), proxy, shell);

            handle.load(URL)?;
            next_event(&mut events).await; // opened
            assert_eq!(next_event(&mut events).await, sentence("Hello world."));

            handle.stop()?;
            assert_eq!(next_event(&mut events).await, ReaderEvent::ReaderClosed);

            // No orphaned tick ever arrives after the session is gone.
            expect_no_event(&mut events, Duration::from_secs(5)).await;

            handle.shutdown()?;
            task.await?;
            Ok(())
        })
        .await
}

/// Test that loading a new page mid-cadence never lets the old timer
/// advance the new session
#[tokio::test(start_paused = true)]
async fn test_timed_reading_withReloadMidCadence_shouldNotLeakOldTimer() -> Result<()> {
    let local = LocalSet::new();
    local
        .run_until(async {
            let other = "https://example.com/other";
            let proxy = common::mocks::MockProxy::new()
                .with_page(URL, common::THREE_SENTENCE_PAGE)
                .with_page(other, common::TWO_SENTENCE_PAGE);
            let (shell, _state) = RecordingShell::new();
            let (handle, mut events, task) =
                start_reader(test_config(500), ReaderHooks::default(), proxy, shell);

            handle.load(URL)?;
            next_event(&mut events).await; // opened
            assert_eq!(next_event(&mut events).await, sentence("Hello world."));

            handle.load(other)?;
            assert_eq!(next_event(&mut events).await, ReaderEvent::ReaderClosed);
            assert_eq!(
                next_event(&mut events).await,
                ReaderEvent::ReaderOpened {
                    original_url: other.to_string(),
                    sentence_count: 2,
                }
            );

            // Only the new session's cadence is observed from here on.
            assert_eq!(next_event(&mut events).await, sentence("One."));
            assert_eq!(next_event(&mut events).await, sentence(" Two."));
            assert_eq!(next_event(&mut events).await, ReaderEvent::ReaderClosed);

            handle.shutdown()?;
            task.await?;
            Ok(())
        })
        .await
}
