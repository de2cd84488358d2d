use askama::Template;

use super::{ElementHandle, ItemContent, ListView, PLACEHOLDER_TEXT};

pub struct PageRow<'a> {
    pub handle: ElementHandle,
    pub placeholder: bool,
    pub caption: &'a str,
    pub review: &'a str,
    pub delete_control: bool,
}

/// The whole page: the notes list followed by the submit form.
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    pub rows: Vec<PageRow<'a>>,
    pub input: &'a str,
    pub placeholder_text: &'a str,
}

impl<'a> PageTemplate<'a> {
    pub fn new(view: &'a ListView, input: &'a str) -> Self {
        let rows = view
            .items()
            .iter()
            .map(|item| match &item.content {
                ItemContent::Entry {
                    caption,
                    review,
                    delete_control,
                    ..
                } => PageRow {
                    handle: item.handle,
                    placeholder: false,
                    caption,
                    review,
                    delete_control: *delete_control,
                },
                ItemContent::Placeholder => PageRow {
                    handle: item.handle,
                    placeholder: true,
                    caption: "",
                    review: "",
                    delete_control: false,
                },
            })
            .collect();

        Self {
            rows,
            input,
            placeholder_text: PLACEHOLDER_TEXT,
        }
    }
}

pub fn render_page(view: &ListView, input: &str) -> Result<String, askama::Error> {
    PageTemplate::new(view, input).render()
}
