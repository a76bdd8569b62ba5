//! Slide content: title and content placeholders, shape summaries, tables
//! and autoshapes.

use super::package::{Package, SlideRef};
use super::shapes::{self, Bounds, ShapeInfo};
use crate::common::error::{Error, Result};
use crate::common::xml::XmlElement;

/// Position of the title placeholder (`idx` 0) among the tree's children.
fn title_position(tree: &XmlElement) -> Option<usize> {
    tree.elements()
        .position(|e| e.is("sp") && shapes::placeholder_key(e).is_some_and(|k| k.idx == 0))
}

/// Position of the content placeholder: the one with `idx` 1, else the
/// second placeholder. Slides with fewer than two placeholders have none.
fn content_position(tree: &XmlElement) -> Option<usize> {
    let placeholders: Vec<(usize, &XmlElement)> = tree
        .elements()
        .enumerate()
        .filter(|(_, e)| shapes::placeholder(e).is_some())
        .collect();
    if placeholders.len() < 2 {
        return None;
    }
    placeholders
        .iter()
        .find(|(_, e)| shapes::placeholder_key(e).is_some_and(|k| k.idx == 1))
        .or_else(|| placeholders.get(1))
        .filter(|(_, e)| e.is("sp"))
        .map(|(i, _)| *i)
}

impl Package {
    /// Set the title placeholder's text. Returns false when the slide has
    /// no title placeholder.
    pub fn set_title(&mut self, slide: &SlideRef, value: &str) -> Result<bool> {
        self.set_placeholder_text(slide, value, title_position)
    }

    /// Set the content placeholder's text, one paragraph per line. Returns
    /// false when the slide has no content placeholder.
    pub fn set_content(&mut self, slide: &SlideRef, value: &str) -> Result<bool> {
        self.set_placeholder_text(slide, value, content_position)
    }

    fn set_placeholder_text(
        &mut self,
        slide: &SlideRef,
        value: &str,
        locate: fn(&XmlElement) -> Option<usize>,
    ) -> Result<bool> {
        let tree = self.shape_tree_mut(&slide.partname)?;
        let Some(position) = locate(tree) else {
            return Ok(false);
        };
        match tree.elements_mut().nth(position) {
            Some(shape) => {
                shapes::set_shape_text(shape, value);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Text of every shape with a text frame, in shape order, one per line.
    pub fn slide_text(&self, slide: &SlideRef) -> Result<String> {
        Ok(shapes::shapes(self.shape_tree(&slide.partname)?)
            .filter_map(shapes::shape_text)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Summaries of the slide's top-level shapes. Placeholders without
    /// their own geometry report the layout's, else the master's.
    pub fn shape_infos(&self, slide: &SlideRef) -> Result<Vec<ShapeInfo>> {
        let tree = self.shape_tree(&slide.partname)?;
        let layout = self.layout_of(slide).ok();
        let layout_tree = layout.as_ref().and_then(|l| self.shape_tree(l).ok());
        let master_tree = layout
            .as_ref()
            .and_then(|l| self.master_of(l).ok())
            .and_then(|m| self.shape_tree(&m).ok());

        Ok(shapes::shapes(tree)
            .map(|shape| {
                let inherited = shapes::placeholder_key(shape).and_then(|key| {
                    layout_tree
                        .and_then(|t| shapes::inherited_placeholder(t, &key, false))
                        .and_then(shapes::own_bounds)
                        .or_else(|| {
                            master_tree
                                .and_then(|t| shapes::inherited_placeholder(t, &key, true))
                                .and_then(shapes::own_bounds)
                        })
                });
                shapes::shape_info(shape, inherited)
            })
            .collect())
    }

    /// Add a table of `headers` (first row, when given) and `rows`.
    ///
    /// Column count follows the headers, else the first row, else 1; cells
    /// past it are dropped.
    pub fn add_table(
        &mut self,
        slide: &SlideRef,
        headers: &[String],
        rows: &[Vec<String>],
        bounds: Bounds,
    ) -> Result<()> {
        let cols = if !headers.is_empty() {
            headers.len()
        } else {
            rows.first().map_or(1, Vec::len).max(1)
        };
        let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
        if !headers.is_empty() {
            cells.push(headers.to_vec());
        }
        cells.extend(rows.iter().map(|row| row.iter().take(cols).cloned().collect()));
        if cells.is_empty() {
            return Err(Error::invalid("a table needs headers or at least one row"));
        }

        let tree = self.shape_tree_mut(&slide.partname)?;
        let id = shapes::max_shape_id(tree) + 1;
        tree.push(shapes::new_table(id, bounds, &cells, cols));
        Ok(())
    }

    /// Add a preset autoshape; unknown keys give a rectangle. `fill` is an
    /// `RRGGBB` color.
    pub fn add_shape(
        &mut self,
        slide: &SlideRef,
        key: &str,
        bounds: Bounds,
        text: &str,
        fill: Option<&str>,
    ) -> Result<()> {
        let tree = self.shape_tree_mut(&slide.partname)?;
        let id = shapes::max_shape_id(tree) + 1;
        tree.push(shapes::new_autoshape(id, key, bounds, text, fill));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::unit::inches_to_emu;

    fn one_slide(layout_index: usize) -> (Package, SlideRef) {
        let mut pkg = Package::new().unwrap();
        let layout = pkg.slide_layouts().unwrap()[layout_index].clone();
        let slide = pkg.add_slide(&layout).unwrap();
        (pkg, slide)
    }

    fn inches(left: f64, top: f64, width: f64, height: f64) -> Bounds {
        Bounds {
            left: inches_to_emu(left),
            top: inches_to_emu(top),
            width: inches_to_emu(width),
            height: inches_to_emu(height),
        }
    }

    #[test]
    fn test_title_and_content() {
        let (mut pkg, slide) = one_slide(1);
        assert!(pkg.set_title(&slide, "Agenda").unwrap());
        assert!(pkg.set_content(&slide, "one\ntwo").unwrap());
        assert_eq!(pkg.slide_text(&slide).unwrap(), "Agenda\none\ntwo");
    }

    #[test]
    fn test_title_only_layout_has_no_content() {
        let (mut pkg, slide) = one_slide(5);
        assert!(pkg.set_title(&slide, "Only").unwrap());
        assert!(!pkg.set_content(&slide, "ignored").unwrap());
        assert_eq!(pkg.slide_text(&slide).unwrap(), "Only");
    }

    #[test]
    fn test_blank_layout_has_no_title() {
        let (mut pkg, slide) = one_slide(6);
        assert!(!pkg.set_title(&slide, "nothing").unwrap());
        assert_eq!(pkg.slide_text(&slide).unwrap(), "");
    }

    #[test]
    fn test_shape_infos_inherit_placeholder_geometry() {
        let (mut pkg, slide) = one_slide(1);
        pkg.add_shape(&slide, "oval", inches(1.0, 1.0, 3.0, 1.0), "", Some("00FF00"))
            .unwrap();
        let infos = pkg.shape_infos(&slide).unwrap();
        assert_eq!(infos.len(), 3);
        assert_eq!(infos[0].shape_type, "placeholder");
        assert!(infos[0].left.is_some());
        assert!(infos[1].width.is_some());
        assert_eq!(infos[2].shape_type, "oval");
        assert_eq!(infos[2].left, Some(914400));
        assert_eq!(infos[2].text.as_deref(), Some(""));
    }

    #[test]
    fn test_add_table_column_rules() {
        let (mut pkg, slide) = one_slide(6);
        let rows = vec![
            vec!["1".to_string(), "2".to_string(), "extra".to_string()],
            vec!["3".to_string()],
        ];
        pkg.add_table(
            &slide,
            &["A".to_string(), "B".to_string()],
            &rows,
            inches(1.0, 2.0, 8.0, 3.0),
        )
        .unwrap();
        pkg.add_table(&slide, &[], &rows[1..], inches(1.0, 2.0, 8.0, 3.0))
            .unwrap();

        let infos = pkg.shape_infos(&slide).unwrap();
        assert_eq!(infos[0].table, Some((3, 2)));
        assert_eq!(infos[1].table, Some((1, 1)));

        let err = pkg
            .add_table(&slide, &[], &[], inches(1.0, 2.0, 8.0, 3.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
