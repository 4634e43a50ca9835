use campaign_mailer::dispatcher::DeliveryError;
use campaign_mailer::renderer::TemplateRenderer;
use tokio::time::Instant;

use crate::helpers::{
    FakeTransport, StaticRenderer, address, dispatcher, options, record, records,
};

#[tokio::test]
async fn a_rejected_recipient_does_not_stop_its_sibling() {
    // Arrange
    let transport = FakeTransport::rejecting(&["bounced@shoemart.in"]);
    let dispatcher = dispatcher(&transport, options(20, 10, None));
    let records = vec![record("bounced@shoemart.in"), record("ravi@shoemart.in")];

    // Act
    let report = dispatcher
        .dispatch(&records, "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    // Assert
    assert_eq!(report.counts(), (1, 1));
    let log = transport.log();
    assert_eq!(log.attempts, vec!["bounced@shoemart.in", "ravi@shoemart.in"]);
    assert_eq!(log.deliveries[0].to, "ravi@shoemart.in");
}

#[tokio::test]
async fn the_failure_reason_is_recorded_per_recipient() {
    let transport = FakeTransport::rejecting(&["bounced@shoemart.in"]);
    let dispatcher = dispatcher(&transport, options(20, 10, None));
    let records = vec![record("bounced@shoemart.in"), record("ravi@shoemart.in")];

    let report = dispatcher
        .dispatch(&records, "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.email.as_ref(), "bounced@shoemart.in");
    assert_eq!(failure.unique_id, *records[0].unique_id());
    assert!(matches!(failure.error, DeliveryError::Send(_)));
    assert!(failure.error.to_string().contains("mailbox unavailable"));
}

#[tokio::test(start_paused = true)]
async fn a_render_failure_is_isolated_to_its_recipient_across_batches() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(1, 10, None));
    let renderer = StaticRenderer::failing_for(&[address(1).as_str()]);
    let start = Instant::now();

    let report = dispatcher
        .dispatch(&records(3), "Catalogue", &renderer, None)
        .await
        .unwrap();

    assert_eq!(report.counts(), (2, 1));
    assert!(matches!(report.failures[0].error, DeliveryError::Render(_)));
    // The failed recipient never reaches the wire, but its batch still paces the run.
    assert_eq!(transport.log().attempts, vec![address(0), address(2)]);
    assert_eq!(start.elapsed().as_secs(), 20);
}

#[tokio::test]
async fn a_missing_template_fails_every_recipient_without_aborting() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(2, 0, None));
    let dir = tempfile::tempdir().unwrap();
    let renderer = TemplateRenderer::new(&dir.path().join("missing.html"));

    let report = dispatcher
        .dispatch(&records(3), "Catalogue", &renderer, None)
        .await
        .unwrap();

    assert_eq!(report.counts(), (0, 3));
    assert!(
        report
            .failures
            .iter()
            .all(|f| matches!(f.error, DeliveryError::Render(_)))
    );
    let log = transport.log();
    assert!(log.attempts.is_empty());
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn every_failure_leaves_the_counts_consistent() {
    let transport = FakeTransport::rejecting(&[
        address(0).as_str(),
        address(3).as_str(),
        address(4).as_str(),
    ]);
    let dispatcher = dispatcher(&transport, options(2, 0, None));

    let report = dispatcher
        .dispatch(&records(5), "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    assert_eq!(report.counts(), (2, 3));
    assert_eq!(report.failures.len(), report.failed);
}

#[tokio::test]
async fn an_address_the_mail_library_cannot_use_fails_only_that_recipient() {
    // Arrange
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(20, 10, None));
    let records = vec![record("a.@example.com"), record("ravi@shoemart.in")];

    // Act
    let report = dispatcher
        .dispatch(&records, "Catalogue", &StaticRenderer::default(), None)
        .await
        .unwrap();

    // Assert
    assert_eq!(report.counts(), (1, 1));
    let failure = &report.failures[0];
    assert_eq!(failure.email.as_ref(), "a.@example.com");
    assert!(matches!(failure.error, DeliveryError::Compose(_)));
    let log = transport.log();
    assert_eq!(log.attempts, vec!["ravi@shoemart.in"]);
    assert_eq!(log.deliveries[0].to, "ravi@shoemart.in");
}
