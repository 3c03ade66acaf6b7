// src/services/session.rs

//! Portal login.
//!
//! The login page is an ASP.NET form: its hidden fields (view state, event
//! validation and similar) must be echoed back together with the credentials.

use std::collections::BTreeMap;

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{AuthConfig, PortalConfig};
use crate::utils::PortalClient;
use crate::utils::http::LOGIN_PATH;

macro_rules! login_field {
    ($name:literal) => {
        concat!(
            "ctl00$ctl00$ctl00$ctl00$ctl00$ctl00$body$body$body_main$body_main$body_main$body_main$",
            $name
        )
    };
}

/// Form field carrying the user name.
pub const LOGIN_NAME_FIELD: &str = login_field!("txtLoginName");
/// Form field carrying the password.
pub const PASSWORD_FIELD: &str = login_field!("txtPassword");
/// "Remember me" checkbox.
pub const REMEMBER_ME_FIELD: &str = login_field!("cbRememberMe");
/// Submit button marker.
pub const SUBMIT_FIELD: &str = login_field!("btnLogin");

/// An authenticated portal session.
///
/// The cookie jar inside the client is the session state; every request made
/// through [`Session::client`] carries it and absorbs cookies set in reply.
#[derive(Clone)]
pub struct Session {
    client: PortalClient,
}

impl Session {
    pub fn client(&self) -> &PortalClient {
        &self.client
    }
}

/// Establishes sessions by submitting the hidden-field login form.
pub struct SessionEstablisher {
    client: PortalClient,
}

impl SessionEstablisher {
    /// Create an establisher with a fresh cookie jar.
    pub fn new(portal: &PortalConfig) -> Result<Self> {
        Ok(Self {
            client: PortalClient::new(portal)?,
        })
    }

    /// Log in and return the resulting session.
    ///
    /// Any failure is fatal and reported as [`AppError::Session`].
    pub async fn establish(self, auth: &AuthConfig) -> Result<Session> {
        self.login(auth).await.map_err(AppError::session)?;
        Ok(Session {
            client: self.client,
        })
    }

    async fn login(&self, auth: &AuthConfig) -> Result<()> {
        let url = self.client.endpoint(LOGIN_PATH)?;

        let page = self
            .client
            .get_text("login_page", &url, &[] as &[(&str, &str)])
            .await?;
        let mut fields = hidden_fields(&page);
        log::trace!("Login form carries {} hidden fields", fields.len());

        fields.insert(LOGIN_NAME_FIELD.to_string(), auth.user.clone());
        fields.insert(PASSWORD_FIELD.to_string(), auth.pass.clone());
        fields.insert(REMEMBER_ME_FIELD.to_string(), "on".to_string());
        fields.insert(SUBMIT_FIELD.to_string(), "Login".to_string());

        self.client
            .submit("login_submit", |http| http.post(url.clone()).form(&fields))
            .await?;

        log::debug!("Logged in as {}", auth.user);
        Ok(())
    }
}

/// Collect every named hidden input of a page as `name -> value`.
pub fn hidden_fields(html: &str) -> BTreeMap<String, String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"input[type="hidden"]"#) else {
        return BTreeMap::new();
    };

    document
        .select(&selector)
        .filter_map(|input| {
            let element = input.value();
            let name = element.attr("name")?;
            let value = element.attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
        <html><body>
        <form method="post" action="login.aspx">
            <input type="hidden" name="__VIEWSTATE" value="dDwtMTA4MzE0MjEwNTs7Pg==" />
            <input type="hidden" name="__EVENTVALIDATION" value="/wEWBAKl" />
            <input type="hidden" name="__EVENTTARGET" />
            <input type="hidden" value="orphan" />
            <input type="text" name="ignored" value="visible" />
        </form>
        </body></html>
    "#;

    #[test]
    fn collects_named_hidden_inputs() {
        let fields = hidden_fields(LOGIN_PAGE);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["__VIEWSTATE"], "dDwtMTA4MzE0MjEwNTs7Pg==");
        assert_eq!(fields["__EVENTVALIDATION"], "/wEWBAKl");
        assert_eq!(fields["__EVENTTARGET"], "");
        assert!(!fields.contains_key("ignored"));
    }

    #[test]
    fn login_fields_target_the_login_control() {
        assert!(LOGIN_NAME_FIELD.ends_with("$body_main$txtLoginName"));
        assert!(SUBMIT_FIELD.starts_with("ctl00$ctl00$"));
    }
}
