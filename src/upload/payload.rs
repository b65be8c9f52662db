use crate::upload::error::UploadError;
use crate::upload::types::{ModuleId, SelectedFile};
use reqwest::multipart::{Form, Part};

pub const MULTI_FIELD: &str = "files";
pub const SINGLE_FIELD: &str = "file";

pub fn field_name(module: &ModuleId) -> &'static str {
    if module.accepts_many() {
        MULTI_FIELD
    } else {
        SINGLE_FIELD
    }
}

/// Multipart body for one submission. Every selected file is appended under
/// the module's field name, so single-file modules still see each file.
#[derive(Debug)]
pub struct UploadPayload<'a> {
    field: &'static str,
    files: &'a [SelectedFile],
}

impl<'a> UploadPayload<'a> {
    pub fn new(module: &ModuleId, files: &'a [SelectedFile]) -> Result<Self, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }
        Ok(Self {
            field: field_name(module),
            files,
        })
    }

    pub fn parts(&self) -> impl Iterator<Item = (&'static str, &SelectedFile)> + '_ {
        self.files.iter().map(move |file| (self.field, file))
    }

    pub async fn into_form(self) -> Result<Form, UploadError> {
        let mut form = Form::new();
        for (field, file) in self.parts() {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| UploadError::ReadFile {
                    path: file.path.clone(),
                    source,
                })?;
            let part = Part::bytes(bytes).file_name(file.name.clone());
            form = form.part(field, part);
        }
        Ok(form)
    }
}
