use insight_core::{BiliApiError, CommentRecord, CoreError};
use quick_xml::events::Event;
use quick_xml::Reader;

const COMMENT_TAG: &[u8] = b"d";

/// Extract the text of every `<d>` element, in document order.
///
/// Blank entries are dropped and surrounding whitespace trimmed. Any XML
/// error fails the whole document; callers treat that as "no comments".
pub fn parse_comment_document(xml: &str) -> Result<Vec<CommentRecord>, CoreError> {
    let mut reader = Reader::from_str(xml);
    let mut comments = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == COMMENT_TAG => {
                current = Some(String::new());
            }
            Ok(Event::Text(t)) => {
                if let Some(buf) = current.as_mut() {
                    let text = t.unescape().map_err(|e| malformed(&reader, e))?;
                    buf.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == COMMENT_TAG => {
                if let Some(buf) = current.take() {
                    let text = buf.trim();
                    if !text.is_empty() {
                        comments.push(text.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(&reader, e)),
            _ => {}
        }
    }

    Ok(comments)
}

fn malformed(reader: &Reader<&[u8]>, error: quick_xml::Error) -> CoreError {
    CoreError::BiliApi(BiliApiError::MalformedDocument {
        details: format!("at byte {}: {}", reader.buffer_position(), error),
    })
}
