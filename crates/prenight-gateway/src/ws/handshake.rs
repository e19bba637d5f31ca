use prenight_core::config::{MAX_PAYLOAD_BYTES, PROTOCOL_VERSION};
use prenight_core::types::DocumentId;
use prenight_core::PlotName;
use prenight_protocol::{
    document::{DocumentHello, ServerInfo},
    frames::SessionEvent,
};

/// The `document.hello` event that opens every plot session.
pub fn hello_event(document: &DocumentId, plot: &PlotName) -> SessionEvent {
    SessionEvent::Hello(DocumentHello {
        protocol: PROTOCOL_VERSION,
        document_id: document.to_string(),
        plot: plot.to_string(),
        server: ServerInfo {
            name: "prenight".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        max_message_size: MAX_PAYLOAD_BYTES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_names_document_and_plot() {
        let doc = DocumentId::new();
        let SessionEvent::Hello(hello) = hello_event(&doc, &PlotName::visit()) else {
            panic!("expected document.hello");
        };
        assert_eq!(hello.document_id, doc.as_str());
        assert_eq!(hello.plot, "visit");
        assert_eq!(hello.protocol, PROTOCOL_VERSION);
    }
}
