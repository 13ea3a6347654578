//! Product form parsing
//!
//! Text values arrive untyped. They are parsed here into `ProductCreate` /
//! `ProductUpdate` so the service only ever sees typed records.
//!
//! | Field | Create when empty | Update when empty |
//! |-------|-------------------|-------------------|
//! | name, price | required | rejected |
//! | description, wholesale_price, category_id | null | cleared to null |
//! | wholesale_min_quantity | 1 | rejected |
//! | stock, discount_percent | 0 | rejected |
//! | is_active | ignored | rejected |

use std::collections::HashMap;

use axum::extract::Multipart;
use shared::models::{DEFAULT_WHOLESALE_MIN_QUANTITY, Patch, ProductCreate, ProductUpdate};

use crate::services::ImageUpload;
use crate::utils::{AppError, AppResult};

/// Name of the file part carrying the product image
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default)]
pub struct ProductForm {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl ProductForm {
    /// Collect text fields and the optional image from a multipart body
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("Invalid multipart request: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read image: {e}")))?;
                // Browsers send an empty part when no file was chosen
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.image = Some(ImageUpload::new(&file_name, &content_type, bytes.to_vec())?);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::invalid_field(&name, format!("Unreadable field: {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    /// Trimmed value, `None` when the key is missing
    fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|v| v.trim())
    }

    /// Trimmed non-empty value
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn into_create(self) -> AppResult<(ProductCreate, Option<ImageUpload>)> {
        let name = self
            .non_empty("name")
            .ok_or_else(|| AppError::invalid_field("name", "Name is required"))?
            .to_string();
        let price = self
            .non_empty("price")
            .ok_or_else(|| AppError::invalid_field("price", "Price is required"))
            .and_then(|v| parse_number::<f64>("price", v))?;

        let data = ProductCreate {
            name,
            description: self.non_empty("description").map(str::to_string),
            price,
            wholesale_price: self
                .non_empty("wholesale_price")
                .map(|v| parse_number("wholesale_price", v))
                .transpose()?,
            wholesale_min_quantity: self
                .non_empty("wholesale_min_quantity")
                .map(|v| parse_number("wholesale_min_quantity", v))
                .transpose()?
                .unwrap_or(DEFAULT_WHOLESALE_MIN_QUANTITY),
            stock: self
                .non_empty("stock")
                .map(|v| parse_number("stock", v))
                .transpose()?
                .unwrap_or(0),
            discount_percent: self
                .non_empty("discount_percent")
                .map(|v| parse_number("discount_percent", v))
                .transpose()?
                .unwrap_or(0),
            category_id: self
                .non_empty("category_id")
                .map(|v| parse_number("category_id", v))
                .transpose()?,
        };

        Ok((data, self.image))
    }

    pub fn into_update(self) -> AppResult<(ProductUpdate, Option<ImageUpload>)> {
        let data = ProductUpdate {
            name: self.required("name", |v| Ok(v.to_string()))?,
            description: self.nullable("description", |v| Ok(v.to_string()))?,
            price: self.required("price", |v| parse_number("price", v))?,
            wholesale_price: self.nullable("wholesale_price", |v| {
                parse_number("wholesale_price", v)
            })?,
            wholesale_min_quantity: self.required("wholesale_min_quantity", |v| {
                parse_number("wholesale_min_quantity", v)
            })?,
            stock: self.required("stock", |v| parse_number("stock", v))?,
            discount_percent: self.required("discount_percent", |v| {
                parse_number("discount_percent", v)
            })?,
            category_id: self.nullable("category_id", |v| parse_number("category_id", v))?,
            is_active: self.required("is_active", |v| parse_bool("is_active", v))?,
        };

        Ok((data, self.image))
    }

    /// Present field that must carry a value
    fn required<T>(&self, key: &str, parse: impl Fn(&str) -> AppResult<T>) -> AppResult<Patch<T>> {
        match self.get(key) {
            None => Ok(Patch::Absent),
            Some("") => Err(AppError::invalid_field(key, format!("{key} cannot be empty"))),
            Some(v) => parse(v).map(Patch::Present),
        }
    }

    /// Present field where empty means null
    fn nullable<T>(
        &self,
        key: &str,
        parse: impl Fn(&str) -> AppResult<T>,
    ) -> AppResult<Patch<Option<T>>> {
        match self.get(key) {
            None => Ok(Patch::Absent),
            Some("") => Ok(Patch::Present(None)),
            Some(v) => parse(v).map(|v| Patch::Present(Some(v))),
        }
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> AppResult<T> {
    value.parse().map_err(|_| {
        AppError::invalid_field(field, format!("{field} must be a number, got '{value}'"))
    })
}

/// `true/false/1/0/on/off`, case-insensitive
fn parse_bool(field: &str, value: &str) -> AppResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(AppError::invalid_field(
            field,
            format!("{field} must be true or false, got '{value}'"),
        )),
    }
}
