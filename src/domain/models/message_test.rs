use super::Author;
use super::Message;
use super::MessageType;

#[test]
fn it_appends_text() {
    let mut message = Message::new(1, Author::Assistant, "Hello");
    message.append(" world");
    message.append("!");

    assert_eq!(message.text, "Hello world!");
    assert_eq!(message.message_type(), MessageType::Normal);
}

#[test]
fn it_replaces_text_on_failure() {
    let mut message = Message::new(1, Author::Assistant, "partial resp");
    message.fail("Connection error: HTTP error! status: 500");

    assert_eq!(message.text, "Connection error: HTTP error! status: 500");
    assert_eq!(message.message_type(), MessageType::Error);
}

#[test]
fn it_carries_an_attachment() {
    let message =
        Message::new(3, Author::User, "Uploaded a receipt").with_attachment("data:image/png;base64,aGk=".to_string());

    assert_eq!(
        message.attachment.as_deref(),
        Some("data:image/png;base64,aGk=")
    );
}
