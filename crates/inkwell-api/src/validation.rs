use thiserror::Error;
use validator::ValidateEmail;

use inkwell_types::api::{
    CreatePostRequest, CreateUserRequest, LoginRequest, UpdatePostRequest, UpdateUserRequest,
};

/// The first rule a request broke, as a field-describing message.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

/// Normalize, then check, an incoming request body.
pub trait Validate {
    /// Trim and HTML-escape free-text fields. Passwords are left untouched.
    fn prepare(&mut self);

    fn validate(&self) -> Result<(), ValidationError>;
}

/// Escape the characters that matter inside HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn clean(field: &mut String) {
    *field = escape_html(field.trim());
}

fn require(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError(message));
    }
    Ok(())
}

fn require_email<E>(email: &E) -> Result<(), ValidationError>
where
    E: ValidateEmail + AsRef<str>,
{
    require(email.as_ref(), "Required Email")?;
    if !email.validate_email() {
        return Err(ValidationError("Invalid Email"));
    }
    Ok(())
}

impl Validate for CreateUserRequest {
    fn prepare(&mut self) {
        clean(&mut self.nickname);
        clean(&mut self.email);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.nickname, "Required Nickname")?;
        require(&self.password, "Required Password")?;
        require_email(&self.email)
    }
}

impl Validate for UpdateUserRequest {
    fn prepare(&mut self) {
        if let Some(nickname) = self.nickname.as_mut() {
            clean(nickname);
        }
        if let Some(email) = self.email.as_mut() {
            clean(email);
        }
    }

    /// Absent fields keep their stored value; present ones must be valid.
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(nickname) = &self.nickname {
            require(nickname, "Required Nickname")?;
        }
        if let Some(password) = &self.password {
            require(password, "Required Password")?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }
}

impl Validate for LoginRequest {
    fn prepare(&mut self) {
        clean(&mut self.email);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.password, "Required Password")?;
        require_email(&self.email)
    }
}

impl Validate for CreatePostRequest {
    fn prepare(&mut self) {
        clean(&mut self.title);
        clean(&mut self.content);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "Required Title")?;
        require(&self.content, "Required Content")?;
        if self.author_id == 0 {
            return Err(ValidationError("Required Author"));
        }
        Ok(())
    }
}

impl Validate for UpdatePostRequest {
    fn prepare(&mut self) {
        clean(&mut self.title);
        clean(&mut self.content);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "Required Title")?;
        require(&self.content, "Required Content")
    }
}
