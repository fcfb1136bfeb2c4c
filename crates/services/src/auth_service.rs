//! Sessions, registration, password recovery and captchas.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use domains::{
    CaptchaGenerator, DomainError, Mailer, NewUser, PasswordHasher, Result, SessionStore, User,
};
use tracing::{debug, info, warn};

use crate::dto::{
    AuthResponse, CaptchaResponse, ChangePasswordRequest, FieldErrors, LoginRequest,
    RegisterRequest, RestoreRequest, ResultResponse,
};
use crate::{mappers, secrets, validation, Repositories};

const CAPTCHA_MISMATCH: &str = "Code from the picture is entered incorrectly";
const STALE_RECOVERY_CODE: &str =
    "Password recovery link is out of date. <a href=\"/auth/restore\">Request a new one</a>";

#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Public root of the site, used to build recovery links.
    pub base_url: String,
    /// Captcha codes older than this are rejected and swept.
    pub captcha_ttl: Duration,
    /// How long a login lasts; also the cookie lifetime.
    pub session_ttl: Duration,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            captcha_ttl: Duration::hours(1),
            session_ttl: Duration::days(14),
        }
    }
}

pub struct AuthService {
    repos: Repositories,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    captcha: Arc<dyn CaptchaGenerator>,
    options: AuthOptions,
}

impl AuthService {
    pub fn new(
        repos: Repositories,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        captcha: Arc<dyn CaptchaGenerator>,
        options: AuthOptions,
    ) -> Self {
        Self { repos, sessions, hasher, mailer, captcha, options }
    }

    /// Binds `session_id` to the user on valid credentials.
    pub async fn login(&self, session_id: &str, request: LoginRequest) -> Result<AuthResponse> {
        let email = normalize_email(&request.e_mail);
        let Some(user) = self.repos.users.find_by_email(&email).await? else {
            debug!(email = %email, "login with unknown e-mail");
            return Ok(AuthResponse::anonymous());
        };
        if !self.hasher.verify(&request.password, &user.password_hash) {
            debug!(user_id = user.id, "login with wrong password");
            return Ok(AuthResponse::anonymous());
        }

        self.sessions.bind(session_id, user.id);
        info!(user_id = user.id, "user logged in");
        self.authenticated(&user).await
    }

    pub async fn check(&self, session_id: Option<&str>) -> Result<AuthResponse> {
        match self.current_user(session_id).await? {
            Some(user) => self.authenticated(&user).await,
            None => Ok(AuthResponse::anonymous()),
        }
    }

    pub fn logout(&self, session_id: Option<&str>) -> ResultResponse {
        if let Some(id) = session_id {
            if let Some(user_id) = self.sessions.resolve(id) {
                info!(user_id, "user logged out");
            }
            self.sessions.revoke(id);
        }
        ResultResponse::ok()
    }

    /// The user bound to the session, if it still exists.
    pub async fn current_user(&self, session_id: Option<&str>) -> Result<Option<User>> {
        let Some(user_id) = session_id.and_then(|id| self.sessions.resolve(id)) else {
            return Ok(None);
        };
        self.repos.users.find_by_id(user_id).await
    }

    /// Mails a recovery link to a known address.
    pub async fn restore(&self, request: RestoreRequest) -> Result<ResultResponse> {
        let email = normalize_email(&request.email);
        let Some(user) = self.repos.users.find_by_email(&email).await? else {
            return Ok(ResultResponse::fail());
        };

        let code = secrets::generate_secret();
        self.repos.users.set_code(user.id, Some(code.clone())).await?;

        let link = format!(
            "{}/login/change-password/{}",
            self.options.base_url.trim_end_matches('/'),
            code
        );
        let body = format!(
            "Hello, {}!\n\nTo set a new password follow the link:\n{}\n",
            user.name, link
        );
        if let Err(e) = self.mailer.send(&user.email, "Password recovery", &body).await {
            warn!(user_id = user.id, error = %e, "recovery mail not sent");
            return Ok(ResultResponse::fail());
        }

        info!(user_id = user.id, "recovery link sent");
        Ok(ResultResponse::ok())
    }

    pub async fn change_password(&self, request: ChangePasswordRequest) -> Result<ResultResponse> {
        let mut errors = FieldErrors::default();

        let user = match request.code.trim() {
            "" => None,
            code => self.repos.users.find_by_code(code).await?,
        };
        if user.is_none() {
            errors.code = Some(STALE_RECOVERY_CODE.into());
        }
        if !self.captcha_matches(&request.captcha, &request.captcha_secret).await? {
            errors.captcha = Some(CAPTCHA_MISMATCH.into());
        }
        errors.password = validation::password_error(&request.password);

        let user = match user {
            Some(user) if errors.is_empty() => user,
            _ => return Ok(ResultResponse::from_errors(errors)),
        };

        let hash = self.hasher.hash(&request.password)?;
        self.repos.users.update_password(user.id, &hash).await?;
        self.repos.users.set_code(user.id, None).await?;
        self.spend_captcha(&request.captcha_secret).await?;
        info!(user_id = user.id, "password changed via recovery link");
        Ok(ResultResponse::ok())
    }

    /// Creates an account. Unavailable (404) while multi-user mode is off.
    pub async fn register(&self, request: RegisterRequest) -> Result<ResultResponse> {
        let settings = self.repos.settings.load().await?;
        if !settings.multiuser_mode {
            return Err(DomainError::NotFound("Registration".into(), "multiuser mode".into()));
        }

        let email = normalize_email(&request.e_mail);
        let mut errors = FieldErrors::default();

        if !validation::is_plausible_email(&email) {
            errors.email = Some("E-mail is invalid".into());
        } else if self.repos.users.find_by_email(&email).await?.is_some() {
            errors.email = Some("This e-mail is already registered".into());
        }
        errors.name = validation::name_error(Some(&request.name));
        errors.password = validation::password_error(&request.password);
        if !self.captcha_matches(&request.captcha, &request.captcha_secret).await? {
            errors.captcha = Some(CAPTCHA_MISMATCH.into());
        }

        if !errors.is_empty() {
            return Ok(ResultResponse::from_errors(errors));
        }

        let user = self
            .repos
            .users
            .insert(NewUser {
                name: request.name.trim().to_string(),
                email,
                password_hash: self.hasher.hash(&request.password)?,
                reg_time: Utc::now(),
                is_moderator: false,
            })
            .await?;
        self.spend_captcha(&request.captcha_secret).await?;

        info!(user_id = user.id, "user registered");
        Ok(ResultResponse::ok())
    }

    /// Issues a new captcha and sweeps the expired ones.
    pub async fn captcha(&self) -> Result<CaptchaResponse> {
        self.sweep_captchas().await?;

        let drawn = self.captcha.generate()?;
        let secret = secrets::generate_secret();
        self.repos.captchas.insert(&drawn.code, &secret, Utc::now()).await?;

        Ok(CaptchaResponse {
            secret,
            image: format!("data:image/png;base64, {}", STANDARD.encode(drawn.png)),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        self.options.session_ttl
    }

    pub fn sweep_sessions(&self) -> usize {
        let removed = self.sessions.sweep();
        if removed > 0 {
            debug!(removed, "expired sessions swept");
        }
        removed
    }

    pub async fn sweep_captchas(&self) -> Result<u64> {
        let cutoff = Utc::now() - self.options.captcha_ttl;
        let removed = self.repos.captchas.delete_older_than(cutoff).await?;
        if removed > 0 {
            debug!(removed, "expired captcha codes swept");
        }
        Ok(removed)
    }

    async fn captcha_matches(&self, typed: &str, secret: &str) -> Result<bool> {
        let (typed, secret) = (typed.trim(), secret.trim());
        if typed.is_empty() || secret.is_empty() {
            return Ok(false);
        }
        let cutoff = Utc::now() - self.options.captcha_ttl;
        Ok(self
            .repos
            .captchas
            .find_by_secret(secret)
            .await?
            .is_some_and(|c| c.time >= cutoff && c.code.eq_ignore_ascii_case(typed)))
    }

    async fn spend_captcha(&self, secret: &str) -> Result<()> {
        self.repos.captchas.delete_by_secret(secret.trim()).await
    }

    async fn authenticated(&self, user: &User) -> Result<AuthResponse> {
        let awaiting = if user.is_moderator {
            self.repos.posts.count_awaiting_moderation(user.id).await?
        } else {
            0
        };
        Ok(AuthResponse { result: true, user: Some(mappers::auth_user(user, awaiting)) })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
