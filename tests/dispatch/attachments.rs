use std::io::Write;
use std::path::Path;

use crate::helpers::{FakeTransport, StaticRenderer, dispatcher, options, records};

#[tokio::test]
async fn a_missing_attachment_degrades_to_plain_messages() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(20, 0, None));

    let report = dispatcher
        .dispatch(
            &records(3),
            "Catalogue",
            &StaticRenderer::default(),
            Some(Path::new("definitely/not/here/catalogue.pdf")),
        )
        .await
        .unwrap();

    assert_eq!(report.counts(), (3, 0));
    assert!(
        transport
            .log()
            .deliveries
            .iter()
            .all(|d| !d.raw.contains("Content-Disposition: attachment"))
    );
}

#[tokio::test]
async fn the_attachment_is_shared_by_every_message() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport, options(2, 0, None));
    let mut file = tempfile::Builder::new()
        .prefix("catalogue")
        .suffix(".pdf")
        .tempfile()
        .unwrap();
    file.write_all(b"%PDF-1.4 catalogue").unwrap();

    let report = dispatcher
        .dispatch(
            &records(3),
            "Catalogue",
            &StaticRenderer::default(),
            Some(file.path()),
        )
        .await
        .unwrap();

    assert_eq!(report.counts(), (3, 0));
    let deliveries = transport.log().deliveries;
    assert_eq!(deliveries.len(), 3);
    for delivery in deliveries {
        assert!(delivery.raw.contains("Content-Disposition: attachment"));
        assert!(delivery.raw.contains("application/pdf"));
    }
}
