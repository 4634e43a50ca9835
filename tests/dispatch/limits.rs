use std::time::Duration;

use tokio::time::Instant;

use crate::helpers::{FakeTransport, StaticRenderer, address, dispatcher, options, records};

#[tokio::test(start_paused = true)]
async fn the_ceiling_caps_sends_and_skips_the_remaining_pauses() {
    // Arrange
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(20, 10, Some(25)));
    let start = Instant::now();

    // Act
    let report = dispatcher
        .dispatch(&records(45), "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    // Assert
    assert_eq!(report.counts(), (25, 0));
    assert!(report.limit_reached);
    assert_eq!(report.batches, 2);
    let log = transport.log();
    assert_eq!(log.attempts.len(), 25);
    assert_eq!(log.attempts.last(), Some(&address(24)));
    // Only the pause between the first and second batch happened.
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn a_ceiling_on_a_batch_boundary_does_not_pause() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(20, 10, Some(20)));
    let start = Instant::now();

    let report = dispatcher
        .dispatch(&records(40), "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    assert_eq!(report.counts(), (20, 0));
    assert!(report.limit_reached);
    assert_eq!(report.batches, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn a_zero_ceiling_sends_nothing_but_still_closes_the_session() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(20, 10, Some(0)));

    let report = dispatcher
        .dispatch(&records(3), "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    assert_eq!(report.counts(), (0, 0));
    let log = transport.log();
    assert!(log.attempts.is_empty());
    assert_eq!(log.connects, 1);
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn the_ceiling_counts_successes_not_attempts() {
    let transport = FakeTransport::rejecting(&[address(0).as_str()]);
    let dispatcher = dispatcher(&transport, options(20, 0, Some(2)));

    let report = dispatcher
        .dispatch(&records(4), "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    assert_eq!(report.counts(), (2, 1));
    assert!(report.limit_reached);
    assert_eq!(
        transport.log().attempts,
        vec![address(0), address(1), address(2)]
    );
}

#[tokio::test]
async fn a_ceiling_above_the_record_count_is_never_reached() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(2, 0, Some(10)));

    let report = dispatcher
        .dispatch(&records(5), "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    assert_eq!(report.counts(), (5, 0));
    assert!(!report.limit_reached);
}

#[tokio::test]
async fn a_ceiling_equal_to_the_record_count_sends_everything() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(2, 0, Some(5)));

    let report = dispatcher
        .dispatch(&records(5), "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    assert_eq!(report.counts(), (5, 0));
    assert!(!report.limit_reached);
}
