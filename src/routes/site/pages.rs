use actix_web::{HttpResponse, web};
use tera::Tera;

use crate::routes::helpers::render;

pub async fn contact_page(tera: web::Data<Tera>) -> Result<HttpResponse, actix_web::Error> {
    render(&tera, "contact.html", &tera::Context::new())
}

pub async fn newsletter_verified(tera: web::Data<Tera>) -> Result<HttpResponse, actix_web::Error> {
    render(&tera, "newsletter_verified.html", &tera::Context::new())
}
