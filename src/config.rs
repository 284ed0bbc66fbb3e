use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::net::{SocketAddr, IpAddr};
use std::default::Default;
use std::fmt::{Display, Formatter};

use clap::Parser;

use crate::error::{self, Context};
use crate::path::{metadata, normalize};

mod shape;

pub const DEFAULT_MASTER_KEY: &str = "merkaz_master_key_secret";

pub trait TryDefault: Sized {
    type Error;

    fn try_default() -> Result<Self, Self::Error>;
}

#[derive(Debug, Parser)]
#[command(author, version ,about, long_about = None)]
pub struct CliArgs {
    /// a config file to load settings from, later files override earlier ones
    #[arg(long)]
    config: Vec<PathBuf>
}

#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
}

pub fn get_config() -> error::Result<Config> {
    Config::from_args(CliArgs::parse())
}

impl Config {
    pub fn from_args(args: CliArgs) -> error::Result<Self> {
        Self::load(args.config)
    }

    pub fn load<I>(paths: I) -> error::Result<Self>
    where
        I: IntoIterator<Item = PathBuf>
    {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Settings")?;
        let mut settings = Settings::try_default()?;

        for config_path in paths {
            let full = if config_path.is_absolute() {
                config_path
            } else {
                normalize(cwd.join(config_path))
            };

            tracing::debug!("loading config file \"{}\"", full.display());

            let loaded = Self::load_file(&full)?;
            let src = SrcFile::new(&full)?;
            let dot = DotPath::new(&"settings");

            settings.merge(&src, dot, loaded)?;
        }

        settings.share = prepare_dir(&settings.share, "settings.share")?;
        settings.trash = prepare_dir(&settings.trash, "settings.trash")?;
        settings.uploads.directory = prepare_dir(&settings.uploads.directory, "settings.uploads.directory")?;
        settings.data = prepare_dir(&settings.data, "settings.data")?;
        settings.logs = prepare_dir(&settings.logs, "settings.logs")?;
        settings.tmp = prepare_dir(&settings.tmp, "settings.tmp")?;

        if settings.trash.starts_with(&settings.share) {
            return Err(error::Error::new()
                .kind("InvalidConfig")
                .message("settings.trash cannot be inside of settings.share"));
        }

        if settings.uploads.directory.starts_with(&settings.share) {
            return Err(error::Error::new()
                .kind("InvalidConfig")
                .message("settings.uploads.directory cannot be inside of settings.share"));
        }

        if settings.listeners.is_empty() {
            settings.listeners.insert("main".into(), Listener::default());
        }

        if settings.master_key == DEFAULT_MASTER_KEY {
            tracing::warn!("settings.master_key is using the default value");
        }

        tracing::debug!("{settings:#?}");

        Ok(Config {
            settings,
        })
    }

    fn load_file(path: &PathBuf) -> error::Result<shape::Settings> {
        let ext = path.extension().context(format!(
            "failed to retrieve the file extension for config file: \"{}\"", path.display()
        ))?;

        let ext = ext.to_ascii_lowercase();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .context(format!("failed to open config file: \"{}\"", path.display()))?;
        let reader = std::io::BufReader::new(file);

        if ext.eq("yaml") || ext.eq("yml") {
            serde_yaml::from_reader(reader).context(format!(
                "failed to parse yaml config file: \"{}\"", path.display()
            ))
        } else if ext.eq("json") {
            serde_json::from_reader(reader).context(format!(
                "failed to parse json config file: \"{}\"", path.display()
            ))
        } else {
            Err(error::Error::new().message(format!(
                "unknown type of config file: \"{}\"", path.display()
            )))
        }
    }
}

struct SrcFile<'a> {
    parent: &'a Path,
    src: &'a Path,
}

impl<'a> SrcFile<'a> {
    fn new(src: &'a Path) -> error::Result<Self> {
        let parent = src.parent().context(format!(
            "failed to retrieve parent path from source file \"{}\"", src.display()
        ))?;

        Ok(SrcFile {
            parent,
            src
        })
    }
}

impl<'a> Display for SrcFile<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.src.display())
    }
}

struct Quote<'a>(&'a dyn Display);

impl<'a> Display for Quote<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

struct DotPath<'a>(Vec<&'a dyn Display>);

impl<'a> DotPath<'a> {
    fn new(name: &'a (dyn Display)) -> Self {
        DotPath(vec![name])
    }

    fn push(&self, name: &'a (dyn Display)) -> Self {
        let mut path = self.0.clone();
        path.push(name);

        DotPath(path)
    }
}

impl<'a> Display for DotPath<'a> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for name in &self.0 {
            if first {
                write!(fmt, "{name}")?;
                first = false;
            } else {
                write!(fmt, ".{name}")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Settings {
    pub share: PathBuf,
    pub trash: PathBuf,
    pub data: PathBuf,
    pub logs: PathBuf,
    pub tmp: PathBuf,
    pub assets: Option<PathBuf>,
    pub master_key: String,
    pub timeout: u64,
    pub listeners: HashMap<String, Listener>,
    pub uploads: Uploads,
    pub feedback: Feedback,
    pub sec: Sec,
}

impl Settings {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, settings: shape::Settings) -> error::Result<()> {
        if let Some(share) = settings.share {
            self.share = resolve_path(share, src);
        }

        if let Some(trash) = settings.trash {
            self.trash = resolve_path(trash, src);
        }

        if let Some(data) = settings.data {
            self.data = resolve_path(data, src);
        }

        if let Some(logs) = settings.logs {
            self.logs = resolve_path(logs, src);
        }

        if let Some(tmp) = settings.tmp {
            self.tmp = resolve_path(tmp, src);
        }

        if let Some(assets) = settings.assets {
            self.assets = Some(check_path(assets, src, dot.push(&"assets"), false)?);
        }

        if let Some(master_key) = settings.master_key {
            if master_key.is_empty() {
                return Err(error::Error::new().message(format!(
                    "{dot}.master_key cannot be empty. file: {src}"
                )));
            }

            self.master_key = master_key;
        }

        if let Some(timeout) = settings.timeout {
            if timeout == 0 {
                return Err(error::Error::new().message(format!(
                    "{dot}.timeout must be greater than 0. file: {src}"
                )));
            }

            self.timeout = timeout;
        }

        if let Some(listeners) = settings.listeners {
            for (key, listener) in listeners {
                if let Some(found) = self.listeners.get_mut(&key) {
                    found.merge(src, dot.push(&Quote(&key)), listener)?;
                } else {
                    let mut default = Listener::default();
                    default.merge(src, dot.push(&Quote(&key)), listener)?;

                    self.listeners.insert(key, default);
                }
            }
        }

        if let Some(uploads) = settings.uploads {
            self.uploads.merge(src, dot.push(&"uploads"), uploads)?;
        }

        if let Some(feedback) = settings.feedback {
            self.feedback.merge(src, dot.push(&"feedback"), feedback)?;
        }

        if let Some(sec) = settings.sec {
            self.sec.merge(src, dot.push(&"sec"), sec)?;
        }

        Ok(())
    }
}

impl TryDefault for Settings {
    type Error = error::Error;

    fn try_default() -> Result<Self, Self::Error> {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Settings")?;

        Ok(Settings {
            share: cwd.join("share"),
            trash: cwd.join("trash"),
            data: cwd.join("data"),
            logs: cwd.join("logs"),
            tmp: cwd.join("tmp"),
            assets: None,
            master_key: DEFAULT_MASTER_KEY.into(),
            timeout: 90,
            listeners: HashMap::new(),
            uploads: Uploads::try_default()?,
            feedback: Feedback::default(),
            sec: Sec::default(),
        })
    }
}

#[derive(Debug)]
pub struct Listener {
    pub addr: SocketAddr,
}

impl Listener {
    fn merge(&mut self, src: &SrcFile<'_>, dot_path: DotPath<'_>, listener: shape::Listener) -> error::Result<()> {
        self.addr = match SocketAddr::from_str(&listener.addr) {
            Ok(valid) => valid,
            Err(_) => match IpAddr::from_str(&listener.addr) {
                Ok(valid) => SocketAddr::from((valid, 8080)),
                Err(_) => {
                    return Err(error::Error::new().message(format!(
                        "{dot_path}.addr invalid: \"{}\" file: {src}", listener.addr
                    )));
                }
            }
        };

        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            addr: SocketAddr::from((
                IpAddr::from([0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]),
                8080
            )),
        }
    }
}

#[derive(Debug)]
pub struct Uploads {
    pub directory: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_size: Option<u64>,
}

impl Uploads {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, uploads: shape::Uploads) -> error::Result<()> {
        if let Some(directory) = uploads.directory {
            self.directory = resolve_path(directory, src);
        }

        if let Some(allowed) = uploads.allowed_extensions {
            let mut list = Vec::with_capacity(allowed.len());

            for ext in allowed {
                let trimmed = ext.trim().trim_start_matches('.');

                if trimmed.is_empty() || trimmed.contains(|c| matches!(c, '/' | '\\' | '.')) {
                    return Err(error::Error::new().message(format!(
                        "{}.allowed_extensions invalid extension: \"{ext}\" file: {src}",
                        dot
                    )));
                }

                list.push(trimmed.to_ascii_lowercase());
            }

            self.allowed_extensions = list;
        }

        if let Some(max_size) = uploads.max_size {
            self.max_size = if max_size == 0 {
                None
            } else {
                Some(max_size)
            };
        }

        Ok(())
    }
}

impl TryDefault for Uploads {
    type Error = error::Error;

    fn try_default() -> Result<Self, Self::Error> {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Uploads")?;

        Ok(Uploads {
            directory: cwd.join("uploads"),
            allowed_extensions: merkaz_lib::fs::DEFAULT_ALLOWED_EXTENSIONS.iter()
                .map(|v| v.to_string())
                .collect(),
            max_size: None,
        })
    }
}

#[derive(Debug)]
pub struct Feedback {
    pub cooldown: Vec<u64>,
}

impl Feedback {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, feedback: shape::Feedback) -> error::Result<()> {
        if let Some(cooldown) = feedback.cooldown {
            if cooldown.is_empty() {
                return Err(error::Error::new().message(format!(
                    "{dot}.cooldown must have at least one level. file: {src}"
                )));
            }

            self.cooldown = cooldown;
        }

        Ok(())
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Feedback {
            cooldown: merkaz_lib::cooldown::DEFAULT_LEVELS.to_vec(),
        }
    }
}

#[derive(Debug)]
pub struct Sec {
    pub session: Session,
    pub admin: Option<Admin>,
}

impl Sec {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, sec: shape::Sec) -> error::Result<()> {
        if let Some(session) = sec.session {
            self.session.merge(src, dot.push(&"session"), session)?;
        }

        if let Some(admin) = sec.admin {
            if !merkaz_lib::users::email_valid(&admin.email) {
                return Err(error::Error::new().message(format!(
                    "{dot}.admin.email invalid: \"{}\" file: {src}", admin.email
                )));
            }

            if let Some(issue) = merkaz_lib::sec::password_issue(&admin.password) {
                return Err(error::Error::new().message(format!(
                    "{dot}.admin.password invalid: {issue} file: {src}"
                )));
            }

            self.admin = Some(Admin {
                email: admin.email,
                password: admin.password,
            });
        }

        Ok(())
    }
}

impl Default for Sec {
    fn default() -> Self {
        Sec {
            session: Default::default(),
            admin: None,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub secure: bool,
    pub idle: u64,
}

impl Session {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, session: shape::Session) -> error::Result<()> {
        if let Some(secure) = session.secure {
            self.secure = secure;
        }

        if let Some(idle) = session.idle {
            if idle == 0 {
                return Err(error::Error::new().message(format!(
                    "{dot}.idle must be greater than 0. file: {src}"
                )));
            }

            self.idle = idle;
        }

        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Session {
            secure: true,
            idle: 60 * 60,
        }
    }
}

pub struct Admin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Admin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn resolve_path(given: PathBuf, src: &SrcFile<'_>) -> PathBuf {
    if given.is_absolute() {
        normalize(given)
    } else {
        normalize(src.parent.join(given))
    }
}

fn check_path(given: PathBuf, src: &SrcFile<'_>, dot: DotPath<'_>, is_file: bool) -> error::Result<PathBuf> {
    let full = resolve_path(given, src);

    tracing::debug!("{dot} {src} checking {}", full.display());

    let meta = metadata(&full).context(format!(
        "{dot} failed to retrieve metadata for: {src}"
    ))?.context(format!(
        "{dot} {src} was not found"
    ))?;

    if is_file {
        if !meta.is_file() {
            return Err(error::Error::new().message(format!(
                "{dot} is not a file in: {src}"
            )));
        }
    } else {
        if !meta.is_dir() {
            return Err(error::Error::new().message(format!(
                "{dot} is not a directory in: {src}"
            )));
        }
    }

    std::fs::canonicalize(&full).context(format!(
        "{dot} failed to canonicalize path in: {src}"
    ))
}

/// creates the directory when missing and returns its canonical form
fn prepare_dir(path: &Path, name: &str) -> error::Result<PathBuf> {
    if let Some(meta) = metadata(path).context(format!(
        "failed to retrieve metadata for {name}"
    ))? {
        if !meta.is_dir() {
            return Err(error::Error::new().message(format!(
                "{name} is not a directory"
            )));
        }
    } else {
        tracing::info!("creating {name} directory \"{}\"", path.display());

        std::fs::create_dir_all(path).context(format!(
            "failed to create {name} directory"
        ))?;
    }

    std::fs::canonicalize(path).context(format!(
        "failed to canonicalize {name}"
    ))
}
