//! Terminal rendering of pairing codes.

use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;

/// Render `code` as a compact QR (two modules per character row) for the
/// operator's terminal. Returns `None` when the payload does not fit a QR code.
pub fn render_qr(code: &str) -> Option<String> {
    let qr = QrCode::new(code.as_bytes()).ok()?;
    Some(
        qr.render::<Dense1x2>()
            .dark_color(Dense1x2::Light)
            .light_color(Dense1x2::Dark)
            .quiet_zone(true)
            .build(),
    )
}

/// Print the pairing QR with a short banner.
pub fn print_pairing_code(code: &str) {
    match render_qr(code) {
        Some(rendered) => {
            println!();
            println!("========================================");
            println!("  Scan with WhatsApp > Linked Devices");
            println!("========================================");
            println!();
            for line in rendered.lines() {
                println!("  {}", line);
            }
            println!();
        }
        None => tracing::warn!("pairing code too long to render as QR"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_block_characters() {
        let rendered = render_qr("2@Zm9vYmFy,cXV4,YmF6").unwrap();
        assert!(rendered.lines().count() > 10);
        assert!(rendered.contains('█') || rendered.contains('▀') || rendered.contains('▄'));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let huge = "x".repeat(8000);
        assert!(render_qr(&huge).is_none());
    }
}
