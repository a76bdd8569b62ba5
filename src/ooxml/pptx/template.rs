//! Default parts of a new presentation.
//!
//! The XML lives under `resources/pptx` and is embedded at compile time.

macro_rules! resource {
    ($path:literal) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/pptx/", $path))
    };
}

/// Empty presentation, 10in x 7.5in, with one slide master.
pub fn default_presentation_xml() -> &'static str {
    resource!("presentation.xml")
}

/// Slide master with title, body, date, footer and slide number
/// placeholders. Its layout list refers to `rId1`..`rId11`.
pub fn default_slide_master_xml() -> &'static str {
    resource!("slideMaster1.xml")
}

/// The 11 standard layouts in master order; index 1 is "Title and Content".
pub fn slide_layouts() -> [&'static str; 11] {
    [
        resource!("slideLayouts/slideLayout1.xml"),
        resource!("slideLayouts/slideLayout2.xml"),
        resource!("slideLayouts/slideLayout3.xml"),
        resource!("slideLayouts/slideLayout4.xml"),
        resource!("slideLayouts/slideLayout5.xml"),
        resource!("slideLayouts/slideLayout6.xml"),
        resource!("slideLayouts/slideLayout7.xml"),
        resource!("slideLayouts/slideLayout8.xml"),
        resource!("slideLayouts/slideLayout9.xml"),
        resource!("slideLayouts/slideLayout10.xml"),
        resource!("slideLayouts/slideLayout11.xml"),
    ]
}

/// Slide with an empty shape tree.
pub fn default_slide_xml() -> &'static str {
    resource!("slide.xml")
}

pub fn default_notes_master_xml() -> &'static str {
    resource!("notesMaster1.xml")
}

/// Notes slide with the slide image and notes body placeholders.
pub fn default_notes_slide_xml() -> &'static str {
    resource!("notesSlide.xml")
}

pub fn default_pres_props_xml() -> &'static str {
    resource!("presProps.xml")
}

pub fn default_view_props_xml() -> &'static str {
    resource!("viewProps.xml")
}

pub fn default_table_styles_xml() -> &'static str {
    resource!("tableStyles.xml")
}
