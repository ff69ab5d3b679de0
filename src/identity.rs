//! Seam to the user store that turns a resolved name into a profile.
//!
//! The store itself lives outside this crate; `UserDirectory` is the
//! interface it implements. `IdentityService` memoizes successful lookups
//! for the life of the service.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::config::{ConfigurationError, Settings, DEFAULT_COOKIE_NAME};
use crate::cookie::TicketResolver;

const AVATAR_SIZE: u32 = 60;
const DEFAULT_AVATAR: &str = "/images/avatars/0t.jpg";
const INSECURE_SITE_PREFIX: &str = "http://www.pathfinder-fr.org";
const MAIL_DOMAIN: &str = "pathfinder-fr.org";
const ADMINISTRATORS_ROLE: &str = "Administrators";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// A user row as the external store returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i32,
    pub name: String,
    pub roles: Vec<String>,
    pub has_avatar_image: bool,
    pub avatar_url: Option<String>,
}

pub trait UserDirectory: Send + Sync {
    /// Looks up a user by exact name. `Ok(None)` if there is no such user.
    fn find_user(&self, name: &str) -> Result<Option<UserRecord>, DirectoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: i32,
    pub user_name: String,
    pub roles: Vec<String>,
    pub avatar_url: String,
}

impl UserProfile {
    /// The pseudo-user the site itself acts as.
    pub fn site() -> Self {
        UserProfile {
            user_id: -1,
            user_name: "site".to_string(),
            roles: Vec::new(),
            avatar_url: DEFAULT_AVATAR.to_string(),
        }
    }

    pub fn email(&self) -> String {
        format!("{}@{}", self.user_name.to_lowercase(), MAIL_DOMAIN)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Site administrators administer every section; `Forum`, `Wiki` and
    /// `Blog` also have their own administrator role.
    pub fn is_administrator_of(&self, section: &str) -> bool {
        let section_role = match section {
            "Forum" => Some("ForumAdministrator"),
            "Wiki" => Some("WikiAdministrator"),
            "Blog" => Some("BlogAdministrator"),
            _ => None,
        };
        self.roles
            .iter()
            .any(|r| r == ADMINISTRATORS_ROLE || Some(r.as_str()) == section_role)
    }
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        let avatar_url = resolve_avatar_url(record.user_id, record.has_avatar_image, record.avatar_url.as_deref());
        UserProfile {
            user_id: record.user_id,
            user_name: record.name,
            roles: record.roles,
            avatar_url,
        }
    }
}

fn resolve_avatar_url(user_id: i32, has_image: bool, url: Option<&str>) -> String {
    if has_image {
        return format!("/Forum/resource.ashx?u={}", user_id);
    }
    match url {
        Some(url) if !url.is_empty() => {
            let starts_insecure = url
                .get(..INSECURE_SITE_PREFIX.len())
                .map_or(false, |head| head.eq_ignore_ascii_case(INSECURE_SITE_PREFIX));
            let url = if starts_insecure {
                format!("https://{}", &url["http://".len()..])
            } else {
                url.to_string()
            };
            format!(
                "/Forum/resource.ashx?url={}&width={}&height={}",
                escape_data_string(&url),
                AVATAR_SIZE,
                AVATAR_SIZE
            )
        }
        _ => DEFAULT_AVATAR.to_string(),
    }
}

// Percent-encodes everything but RFC 3986 unreserved characters.
fn escape_data_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Resolves the current user from a session cookie, caching profiles by
/// case-insensitive user name.
pub struct IdentityService<D> {
    cookie_name: String,
    resolver: TicketResolver,
    directory: D,
    users: RwLock<HashMap<String, Arc<UserProfile>>>,
}

impl<D: UserDirectory> IdentityService<D> {
    pub fn new(resolver: TicketResolver, directory: D) -> Self {
        IdentityService {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            resolver,
            directory,
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Builds the service from startup settings, keeping the cookie name.
    pub fn from_settings(settings: &Settings, directory: D) -> Result<Self, ConfigurationError> {
        let mut service = IdentityService::new(TicketResolver::from_settings(settings)?, directory);
        service.cookie_name = settings.auth_cookie_name.clone();
        Ok(service)
    }

    /// Cookie the HTTP layer should pass to [`current_user`](Self::current_user).
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// The pseudo-user for actions taken by the site itself.
    pub fn site_user(&self) -> UserProfile {
        UserProfile::site()
    }

    /// The profile for the session cookie value, if it names a known user.
    pub fn current_user(&self, cookie: Option<&str>) -> Option<Arc<UserProfile>> {
        let cookie = cookie.filter(|c| !c.is_empty())?;
        let name = self.resolver.resolve_user_name(cookie)?;
        self.user(&name)
    }

    /// Looks up a profile by name, consulting the cache first.
    pub fn user(&self, name: &str) -> Option<Arc<UserProfile>> {
        if name.is_empty() {
            return None;
        }
        let key = name.to_lowercase();
        if let Some(profile) = self.users.read().get(&key) {
            log::trace!("Identity cache hit for {}", name);
            return Some(Arc::clone(profile));
        }

        log::trace!("Identity cache miss for {}", name);
        let record = match self.directory.find_user(name) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("User lookup failed: {}", e);
                return None;
            }
        };

        let profile = Arc::new(UserProfile::from(record));
        let mut users = self.users.write();
        Some(Arc::clone(users.entry(key).or_insert(profile)))
    }

    pub fn cached_users(&self) -> usize {
        self.users.read().len()
    }
}
