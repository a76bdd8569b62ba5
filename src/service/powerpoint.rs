//! PowerPoint operations.

use super::models::*;
use super::{Service, resolve};
use crate::common::color::parse_rgb;
use crate::common::error::Result;
use crate::common::unit::inches_to_emu;
use crate::ooxml::pptx::{Bounds, Package, ShapeInfo, SlideRef};
use tracing::info;

fn inches(left: f64, top: f64, width: f64, height: f64) -> Bounds {
    Bounds {
        left: inches_to_emu(left),
        top: inches_to_emu(top),
        width: inches_to_emu(width),
        height: inches_to_emu(height),
    }
}

/// Fill a fresh slide's title, content and notes. Empty values are
/// skipped, as is content on a layout without a content placeholder.
fn fill_slide(prs: &mut Package, slide: &SlideRef, data: &SlideData) -> Result<()> {
    if !data.title.is_empty() {
        prs.set_title(slide, &data.title)?;
    }
    if !data.content.is_empty() {
        prs.set_content(slide, &data.content)?;
    }
    if !data.notes.is_empty() {
        prs.set_notes_text(slide, &data.notes)?;
    }
    Ok(())
}

fn append_slide(prs: &mut Package, data: &SlideData) -> Result<SlideRef> {
    let layout = prs.default_layout()?;
    let slide = prs.add_slide(&layout)?;
    fill_slide(prs, &slide, data)?;
    Ok(slide)
}

fn summary(info: ShapeInfo) -> ShapeSummary {
    ShapeSummary {
        name: info.name,
        shape_type: info.shape_type,
        left: info.left,
        top: info.top,
        width: info.width,
        height: info.height,
        text: info.text,
        table_rows: info.table.map(|(rows, _)| rows),
        table_cols: info.table.map(|(_, cols)| cols),
    }
}

pub fn create(svc: &Service, req: CreatePptxRequest) -> Result<Outcome> {
    svc.create(&req.file_path, |prs: &mut Package| {
        for data in &req.slides {
            append_slide(prs, data)?;
        }
        Ok(())
    })?;
    info!(path = %req.file_path, slides = req.slides.len(), "presentation created");
    Ok(Outcome::message(format!("Created {}", req.file_path)))
}

pub fn add_slide(svc: &Service, req: AddSlideRequest) -> Result<Outcome> {
    let slide = svc.edit(&req.file_path, |prs: &mut Package| append_slide(prs, &req.slide))?;
    info!(path = %req.file_path, partname = %slide.partname, "slide added");
    Ok(Outcome::message(format!("Slide added to {}", req.file_path)))
}

pub fn read(svc: &Service, req: FileRequest) -> Result<Outcome> {
    let slides = svc.read(&req.file_path, |prs: &Package| {
        prs.slides()?
            .iter()
            .enumerate()
            .map(|(i, slide)| {
                Ok(SlideText {
                    slide_number: i + 1,
                    text: prs.slide_text(slide)?,
                    notes: prs.notes_text(slide)?,
                })
            })
            .collect::<Result<Vec<_>>>()
    })?;
    Outcome::serialized("OK", &serde_json::json!({ "slides": slides }))
}

pub fn add_table(svc: &Service, req: AddPptxTableRequest) -> Result<Outcome> {
    let bounds = inches(req.left, req.top, req.width, req.height);
    svc.edit(&req.file_path, |prs: &mut Package| {
        let slide = resolve::slide(prs, req.slide_index)?;
        prs.add_table(&slide, &req.headers, &req.rows, bounds)
    })?;
    info!(
        path = %req.file_path,
        slide = req.slide_index,
        rows = req.rows.len(),
        "slide table added"
    );
    Ok(Outcome::message(format!("Table added to slide {}", req.slide_index)))
}

/// Each field set in the request overwrites its target when the slide has
/// one; notes are created when missing.
pub fn update_slide(svc: &Service, req: UpdateSlideRequest) -> Result<Outcome> {
    svc.edit(&req.file_path, |prs: &mut Package| {
        let slide = resolve::slide(prs, req.slide_index)?;
        if let Some(title) = &req.title {
            prs.set_title(&slide, title)?;
        }
        if let Some(content) = &req.content {
            prs.set_content(&slide, content)?;
        }
        if let Some(notes) = &req.notes {
            prs.set_notes_text(&slide, notes)?;
        }
        Ok(())
    })?;
    info!(path = %req.file_path, slide = req.slide_index, "slide updated");
    Ok(Outcome::message(format!("Updated slide {}", req.slide_index)))
}

pub fn delete_slide(svc: &Service, req: SlideRequest) -> Result<Outcome> {
    let slide = svc.edit(&req.file_path, |prs: &mut Package| {
        let slide = resolve::slide(prs, req.slide_index)?;
        prs.delete_slide(&slide)?;
        Ok(slide)
    })?;
    info!(path = %req.file_path, slide = req.slide_index, r_id = %slide.r_id, "slide deleted");
    Ok(Outcome::message(format!("Deleted slide {}", req.slide_index)))
}

/// The copy goes to the end of the deck.
pub fn duplicate_slide(svc: &Service, req: SlideRequest) -> Result<Outcome> {
    let copy = svc.edit(&req.file_path, |prs: &mut Package| {
        let slide = resolve::slide(prs, req.slide_index)?;
        prs.duplicate_slide(&slide)
    })?;
    info!(path = %req.file_path, slide = req.slide_index, copy = %copy.partname, "slide duplicated");
    Ok(Outcome::message(format!("Duplicated slide {}", req.slide_index)))
}

pub fn set_notes(svc: &Service, req: SetNotesRequest) -> Result<Outcome> {
    svc.edit(&req.file_path, |prs: &mut Package| {
        let slide = resolve::slide(prs, req.slide_index)?;
        prs.set_notes_text(&slide, &req.notes)
    })?;
    info!(path = %req.file_path, slide = req.slide_index, "slide notes set");
    Ok(Outcome::message(format!("Notes set on slide {}", req.slide_index)))
}

pub fn get_slide_info(svc: &Service, req: SlideRequest) -> Result<Outcome> {
    let info = svc.read(&req.file_path, |prs: &Package| {
        let slide = resolve::slide(prs, req.slide_index)?;
        let layout_name = match prs.layout_of(&slide) {
            Ok(layout) => prs.layout_name(&layout)?,
            Err(_) => String::new(),
        };
        Ok(SlideInfo {
            slide_index: req.slide_index,
            shapes: prs.shape_infos(&slide)?.into_iter().map(summary).collect(),
            notes: prs.notes_text(&slide)?,
            layout_name,
        })
    })?;
    Outcome::serialized("OK", &info)
}

/// Unknown shape types become rectangles.
pub fn add_shape(svc: &Service, req: AddShapeRequest) -> Result<Outcome> {
    let fill = req.fill_color.as_deref().map(parse_rgb).transpose()?;
    let bounds = inches(req.left, req.top, req.width, req.height);
    svc.edit(&req.file_path, |prs: &mut Package| {
        let slide = resolve::slide(prs, req.slide_index)?;
        prs.add_shape(&slide, &req.shape_type, bounds, &req.text, fill.as_deref())
    })?;
    info!(
        path = %req.file_path,
        slide = req.slide_index,
        shape = %req.shape_type,
        "slide shape added"
    );
    Ok(Outcome::message(format!(
        "Shape '{}' added to slide {}",
        req.shape_type, req.slide_index
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn slide(title: &str, content: &str, notes: &str) -> SlideData {
        SlideData {
            title: title.to_string(),
            content: content.to_string(),
            notes: notes.to_string(),
        }
    }

    fn deck(dir: &TempDir, slides: Vec<SlideData>) -> (Service, String) {
        let svc = Service::new();
        let path = dir.path().join("deck.pptx").to_string_lossy().into_owned();
        create(
            &svc,
            CreatePptxRequest {
                file_path: path.clone(),
                slides,
            },
        )
        .unwrap();
        (svc, path)
    }

    fn read_slides(svc: &Service, path: &str) -> Value {
        read(svc, FileRequest { file_path: path.to_string() })
            .unwrap()
            .data
            .unwrap()["slides"]
            .clone()
    }

    fn at(path: &str, slide_index: i64) -> SlideRequest {
        SlideRequest {
            file_path: path.to_string(),
            slide_index,
        }
    }

    #[test]
    fn test_create_and_read() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = deck(
            &dir,
            vec![slide("One", "a\nb", "speak"), slide("Two", "", "")],
        );
        assert_eq!(
            read_slides(&svc, &path),
            json!([
                {"slide_number": 1, "text": "One\na\nb", "notes": "speak"},
                {"slide_number": 2, "text": "Two\n", "notes": ""},
            ])
        );
    }

    #[test]
    fn test_update_and_notes() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = deck(&dir, vec![slide("Old", "body", "")]);
        update_slide(
            &svc,
            UpdateSlideRequest {
                file_path: path.clone(),
                slide_index: 0,
                title: Some("New".to_string()),
                content: None,
                notes: Some("n".to_string()),
            },
        )
        .unwrap();
        assert_eq!(
            read_slides(&svc, &path),
            json!([{"slide_number": 1, "text": "New\nbody", "notes": "n"}])
        );

        let outcome = set_notes(
            &svc,
            SetNotesRequest {
                file_path: path.clone(),
                slide_index: 0,
                notes: "again".to_string(),
            },
        )
        .unwrap();
        assert_eq!(outcome.message, "Notes set on slide 0");
        assert_eq!(read_slides(&svc, &path)[0]["notes"], json!("again"));
    }

    #[test]
    fn test_delete_and_duplicate() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = deck(
            &dir,
            vec![slide("A", "", ""), slide("B", "bee", ""), slide("C", "", "")],
        );
        duplicate_slide(&svc, at(&path, 1)).unwrap();
        let slides = read_slides(&svc, &path);
        assert_eq!(slides.as_array().unwrap().len(), 4);
        assert_eq!(slides[3]["text"], slides[1]["text"]);

        assert_eq!(delete_slide(&svc, at(&path, 0)).unwrap().message, "Deleted slide 0");
        let slides = read_slides(&svc, &path);
        let titles: Vec<&str> = slides
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["text"].as_str().unwrap().lines().next().unwrap_or(""))
            .collect();
        assert_eq!(titles, ["B", "C", "B"]);
    }

    #[test]
    fn test_out_of_range_leaves_file() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = deck(&dir, vec![slide("A", "", "")]);
        let before = std::fs::read(&path).unwrap();
        for index in [1, -1] {
            assert_eq!(delete_slide(&svc, at(&path, index)).unwrap_err().code(), "OUT_OF_RANGE");
            assert_eq!(duplicate_slide(&svc, at(&path, index)).unwrap_err().code(), "OUT_OF_RANGE");
            assert_eq!(get_slide_info(&svc, at(&path, index)).unwrap_err().code(), "OUT_OF_RANGE");
        }
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_table_shape_and_info() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = deck(&dir, vec![slide("Stats", "", "")]);
        add_table(
            &svc,
            AddPptxTableRequest {
                file_path: path.clone(),
                slide_index: 0,
                headers: vec!["A".to_string(), "B".to_string()],
                rows: vec![vec!["1".to_string(), "2".to_string()]],
                left: 1.0,
                top: 2.0,
                width: 8.0,
                height: 3.0,
            },
        )
        .unwrap();
        let outcome = add_shape(
            &svc,
            AddShapeRequest {
                file_path: path.clone(),
                slide_index: 0,
                shape_type: "blob".to_string(),
                left: 1.0,
                top: 1.0,
                width: 3.0,
                height: 1.0,
                text: "hi".to_string(),
                fill_color: Some("#00FF00".to_string()),
            },
        )
        .unwrap();
        assert_eq!(outcome.message, "Shape 'blob' added to slide 0");

        let data = get_slide_info(&svc, at(&path, 0)).unwrap().data.unwrap();
        assert_eq!(data["layout_name"], json!("Title and Content"));
        let shapes = data["shapes"].as_array().unwrap();
        let table = shapes.iter().find(|s| s["shape_type"] == "table").unwrap();
        assert_eq!((table["table_rows"].clone(), table["table_cols"].clone()), (json!(2), json!(2)));
        assert_eq!(table["left"], json!(914400));
        let rect = shapes.last().unwrap();
        assert_eq!(rect["shape_type"], json!("rectangle"));
        assert_eq!(rect["text"], json!("hi"));
    }

    #[test]
    fn test_bad_fill_color() {
        let dir = TempDir::new().unwrap();
        let (svc, path) = deck(&dir, vec![slide("A", "", "")]);
        let err = add_shape(
            &svc,
            AddShapeRequest {
                file_path: path,
                slide_index: 0,
                shape_type: "oval".to_string(),
                left: 1.0,
                top: 1.0,
                width: 1.0,
                height: 1.0,
                text: String::new(),
                fill_color: Some("nope".to_string()),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }
}
