use askama::Template;
use ih_core::models::{Comment, Image};

#[derive(Template)]
#[template(path = "images.html")]
pub struct ImagesTemplate<'a> {
    pub images: &'a Vec<Image>,
    pub username: &'a str,
}

/// The detail page doubles as the fallback view for refused edits and
/// deletes; the error fields render as inline banners when set.
#[derive(Template)]
#[template(path = "image.html")]
pub struct ImageTemplate<'a> {
    pub image: &'a Image,
    pub comments: &'a Vec<Comment>,
    pub edit_error: Option<&'a str>,
    pub delete_error: Option<&'a str>,
    pub username: &'a str,
}

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate<'a> {
    pub username: &'a str,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate<'a> {
    pub image: &'a Image,
    /// Comma-joined tag names prefilled into the tags field.
    pub tag_line: &'a str,
    pub username: &'a str,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "registration.html")]
pub struct RegistrationTemplate<'a> {
    pub error: Option<&'a str>,
}
