//! Discord payload limits and presentation helpers

use super::{Embed, OutgoingMessage};
use crate::models::NotificationKind;

pub const MAX_CONTENT_LEN: usize = 2000;
pub const MAX_EMBED_TITLE_LEN: usize = 256;
pub const MAX_EMBED_DESCRIPTION_LEN: usize = 4096;
pub const MAX_FIELD_NAME_LEN: usize = 256;
pub const MAX_FIELD_VALUE_LEN: usize = 1024;
pub const MAX_FOOTER_LEN: usize = 2048;
pub const MAX_FIELDS: usize = 25;
pub const MAX_THREAD_NAME_LEN: usize = 100;

pub fn colour_for(kind: NotificationKind) -> u32 {
    match kind {
        NotificationKind::StockAlert => 0x2ECC71,
        NotificationKind::Heartbeat => 0x3498DB,
        NotificationKind::Captcha => 0xE67E22,
    }
}

/// Truncate to at most `max_chars` characters, ending with `...` when cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Split a message into chunks respecting Discord's character limit.
/// Breaks on line boundaries where possible; blank lines and `\r` are kept.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // Whether `current` holds at least one line, possibly an empty one
    let mut started = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        if started && current_len + 1 + line_len > max_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
            started = false;
        }

        if line_len > max_len {
            // A single line over the limit is hard-split
            let chars: Vec<char> = line.chars().collect();
            let mut pieces = chars.chunks(max_len).peekable();
            while let Some(piece) = pieces.next() {
                let piece: String = piece.iter().collect();
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
        } else {
            if started {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }
        started = true;
    }

    if started {
        chunks.push(current);
    }

    chunks
}

/// Bring an embed within Discord's per-part limits
pub fn clamp_embed(mut embed: Embed) -> Embed {
    embed.title = embed.title.map(|t| truncate(&t, MAX_EMBED_TITLE_LEN));
    embed.description = embed
        .description
        .map(|d| truncate(&d, MAX_EMBED_DESCRIPTION_LEN));
    embed.footer = embed.footer.map(|f| truncate(&f, MAX_FOOTER_LEN));
    embed.fields.truncate(MAX_FIELDS);
    for field in &mut embed.fields {
        field.name = truncate(&field.name, MAX_FIELD_NAME_LEN);
        field.value = truncate(&field.value, MAX_FIELD_VALUE_LEN);
    }
    embed
}

/// Bring a whole message within limits
pub fn clamp_message(mut message: OutgoingMessage) -> OutgoingMessage {
    message.content = message.content.map(|c| truncate(&c, MAX_CONTENT_LEN));
    message.embeds = message.embeds.into_iter().map(clamp_embed).collect();
    message
}

/// `<@id>` mention markup
pub fn mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("this is too long", 10), "this is...");
        // Multi-byte characters are never split
        let cut = truncate("ééééééééééé", 5);
        assert_eq!(cut, "éé...");
        assert_eq!(cut.chars().count(), 5);
    }

    #[test]
    fn test_split_message_short_text_untouched() {
        assert_eq!(split_message("hello", 2000), vec!["hello".to_string()]);
    }

    #[test]
    fn test_split_message_on_lines() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_message(text, 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_split_message_keeps_blank_lines_and_carriage_returns() {
        let chunks = split_message("\n\nabc\ndef", 5);
        assert_eq!(chunks, vec!["\n\nabc", "def"]);

        let chunks = split_message("line one\r\nline two", 10);
        assert_eq!(chunks, vec!["line one\r", "line two"]);
    }

    #[test]
    fn test_split_message_hard_splits_long_line() {
        let text = "x".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_clamp_embed_limits() {
        let mut embed = Embed {
            title: Some("t".repeat(300)),
            description: Some("d".repeat(5000)),
            footer: Some("f".repeat(3000)),
            ..Default::default()
        };
        for i in 0..30 {
            embed = embed.field(format!("{}{}", "n".repeat(300), i), "v".repeat(2000), true);
        }

        let clamped = clamp_embed(embed);
        assert_eq!(clamped.title.unwrap().chars().count(), MAX_EMBED_TITLE_LEN);
        assert_eq!(
            clamped.description.unwrap().chars().count(),
            MAX_EMBED_DESCRIPTION_LEN
        );
        let footer = clamped.footer.unwrap();
        assert_eq!(footer.chars().count(), MAX_FOOTER_LEN);
        assert!(footer.ends_with("..."));
        assert_eq!(clamped.fields.len(), MAX_FIELDS);
        assert!(clamped
            .fields
            .iter()
            .all(|f| f.name.chars().count() == MAX_FIELD_NAME_LEN && f.name.ends_with("...")));
        assert!(clamped
            .fields
            .iter()
            .all(|f| f.value.chars().count() == MAX_FIELD_VALUE_LEN));
    }

    #[test]
    fn test_colours_differ_per_kind() {
        assert_ne!(
            colour_for(NotificationKind::StockAlert),
            colour_for(NotificationKind::Heartbeat)
        );
        assert_ne!(
            colour_for(NotificationKind::Captcha),
            colour_for(NotificationKind::Heartbeat)
        );
    }
}
