use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error;
use crate::config;
use crate::events::EventLog;
use crate::feedback::Feedback;
use crate::notify::Notifier;
use crate::sec;
use crate::share::Share;
use crate::uploads::Uploads;
use crate::user::UserStore;

#[derive(Debug)]
pub struct Shared {
    assets: Option<PathBuf>,
    share: Share,
    users: UserStore,
    events: EventLog,
    uploads: Uploads,
    feedback: Feedback,
    notifier: Notifier,
    sec: sec::state::Sec,
}

pub type ArcShared = Arc<Shared>;

impl Shared {
    pub fn from_config(config: &config::Config) -> error::Result<Shared> {
        tracing::debug!("creating Shared state");

        let settings = &config.settings;

        Ok(Shared {
            assets: settings.assets.clone(),
            share: Share::new(
                settings.share.clone(),
                settings.trash.clone(),
                settings.tmp.clone(),
            ),
            users: UserStore::load(settings.data.clone())?,
            events: EventLog::open(settings.logs.clone())?,
            uploads: Uploads::new(
                settings.uploads.directory.clone(),
                settings.uploads.allowed_extensions.clone(),
                settings.uploads.max_size,
            ),
            feedback: Feedback::new(settings.feedback.cooldown.clone()),
            notifier: Notifier::default(),
            sec: sec::state::Sec::from_config(config),
        })
    }

    pub fn assets(&self) -> Option<&Path> {
        self.assets.as_deref()
    }

    pub fn share(&self) -> &Share {
        &self.share
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn uploads(&self) -> &Uploads {
        &self.uploads
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn sec(&self) -> &sec::state::Sec {
        &self.sec
    }

    #[inline]
    pub fn auth(&self) -> &sec::state::Sec {
        self.sec()
    }
}

impl AsRef<sec::state::Sec> for Shared {
    fn as_ref(&self) -> &sec::state::Sec {
        &self.sec
    }
}

impl AsRef<UserStore> for Shared {
    fn as_ref(&self) -> &UserStore {
        &self.users
    }
}
