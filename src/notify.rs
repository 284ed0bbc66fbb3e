//! Account notifications.
//!
//! Messages are composed here and handed to a [`Sink`]. The only sink
//! shipped writes them to the structured log.

type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub trait Sink: std::fmt::Debug + Send + Sync {
    fn deliver(&self, message: &Message) -> Result<(), BoxDynError>;
}

#[derive(Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn deliver(&self, message: &Message) -> Result<(), BoxDynError> {
        tracing::info!(
            recipients = %message.recipients.join(", "),
            subject = %message.subject,
            "notification: {}",
            message.body
        );

        Ok(())
    }
}

pub fn new_registration(admins: Vec<String>, email: &str) -> Message {
    Message {
        recipients: admins,
        subject: String::from("New User Registration"),
        body: format!("A new user with the email {email} has registered and is waiting for approval."),
    }
}

pub fn approved(email: &str) -> Message {
    Message {
        recipients: vec![email.to_owned()],
        subject: String::from("Your Account has been Approved!"),
        body: String::from(
            "Congratulations! Your account has been approved by an administrator. You can now log in."
        ),
    }
}

pub fn denied(email: &str) -> Message {
    Message {
        recipients: vec![email.to_owned()],
        subject: String::from("Your Registration Status"),
        body: String::from(
            "We regret to inform you that your registration has been denied at this time."
        ),
    }
}

#[derive(Debug)]
pub struct Notifier {
    sink: Box<dyn Sink>,
}

impl Notifier {
    pub fn new<S>(sink: S) -> Self
    where
        S: Sink + 'static
    {
        Notifier {
            sink: Box::new(sink),
        }
    }

    fn send(&self, message: Message) {
        if message.recipients.is_empty() {
            tracing::warn!("no recipients for notification \"{}\"", message.subject);

            return;
        }

        if let Err(err) = self.sink.deliver(&message) {
            tracing::error!("failed to deliver notification \"{}\": {err}", message.subject);
        }
    }

    pub fn new_registration(&self, admins: Vec<String>, email: &str) {
        self.send(new_registration(admins, email))
    }

    pub fn approved(&self, email: &str) {
        self.send(approved(email))
    }

    pub fn denied(&self, email: &str) {
        self.send(denied(email))
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::new(LogSink)
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Default, Clone)]
    struct Collect(Arc<Mutex<Vec<Message>>>);

    impl Sink for Collect {
        fn deliver(&self, message: &Message) -> Result<(), BoxDynError> {
            self.0.lock().unwrap().push(message.clone());

            Ok(())
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl Sink for Failing {
        fn deliver(&self, _message: &Message) -> Result<(), BoxDynError> {
            Err("smtp unavailable".into())
        }
    }

    #[test]
    fn composes_messages() {
        let collect = Collect::default();
        let notifier = Notifier::new(collect.clone());

        notifier.new_registration(vec![String::from("admin@example.com")], "new@example.com");
        notifier.new_registration(Vec::new(), "lonely@example.com");
        notifier.approved("new@example.com");

        let sent = collect.0.lock().unwrap();

        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].recipients, vec![String::from("admin@example.com")]);
        assert!(sent[0].body.contains("new@example.com"));
        assert_eq!(sent[1].subject, "Your Account has been Approved!");
    }

    #[test]
    fn delivery_failure_swallowed() {
        Notifier::new(Failing).denied("user@example.com");
    }
}
