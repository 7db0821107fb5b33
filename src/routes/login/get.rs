use actix_web::{HttpResponse, web};
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use crate::routes::helpers::{flash_context, render};

pub async fn login_form(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    render(&tera, "login.html", &flash_context(&flash_messages))
}
