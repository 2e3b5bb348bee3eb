//! Second loading pass: link extracted pieces into a tree.
//!
//! Runs only once every piece exists, since metadata may name a parent that
//! was extracted after its child.

use log::{debug, error};

use crate::loader::LoadWarning;
use crate::model::ModelBuilder;
use crate::piece::{PieceId, ROOT_PIECE_NAME};

/// Link every piece to its parent by name.
///
/// Pieces named [`ROOT_PIECE_NAME`] never get a parent; the one the name
/// lookup points at becomes the model root, and can also be named as a
/// parent by its source name. A piece with an empty parent name is adopted
/// by the root. Unknown parents and missing roots leave the
/// piece detached and are reported. Parent cycles coming from metadata are
/// broken afterwards.
pub(crate) fn resolve(model: &mut ModelBuilder) {
    model.root = model.by_name.get(ROOT_PIECE_NAME).copied();
    if model.root.is_none() {
        error!("Model {} has no root piece", model.name);
    }

    for id in 0..model.pieces.len() {
        if model.pieces[id].name == ROOT_PIECE_NAME {
            model.pieces[id].parent = None;
            continue;
        }

        let parent_name = &model.pieces[id].parent_name;
        let parent = if parent_name.is_empty() {
            if model.root.is_none() {
                model.report.push(LoadWarning::MissingRoot {
                    piece: model.pieces[id].name.clone(),
                });
            }
            model.root
        } else {
            let found = model.by_name.get(parent_name).copied().or_else(|| {
                // The scene root may still be named by its source name.
                match model.root_alias.as_deref() {
                    Some(alias) if alias == parent_name => model.root,
                    _ => None,
                }
            });
            if found.is_none() {
                model.report.push(LoadWarning::MissingParent {
                    piece: model.pieces[id].name.clone(),
                    parent: parent_name.clone(),
                });
            }
            found
        };

        if let Some(parent) = parent {
            link(model, id, parent);
        }
    }

    break_cycles(model);
}

fn link(model: &mut ModelBuilder, child: PieceId, parent: PieceId) {
    debug!(
        "Linking piece '{}' under '{}'",
        model.pieces[child].name, model.pieces[parent].name
    );
    model.pieces[child].parent = Some(parent);
    model.pieces[parent].children.push(child);
}

fn unlink(model: &mut ModelBuilder, child: PieceId) {
    if let Some(parent) = model.pieces[child].parent.take() {
        model.pieces[parent].children.retain(|&c| c != child);
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    Pending,
    OnPath,
    Done,
}

/// Walk each parent chain; the piece at which a chain loops back onto
/// itself loses its parent link.
fn break_cycles(model: &mut ModelBuilder) {
    let mut visits = vec![Visit::Pending; model.pieces.len()];
    let mut path = Vec::new();

    for start in 0..model.pieces.len() {
        let mut current = Some(start);
        while let Some(id) = current {
            match visits[id] {
                Visit::Done => break,
                Visit::OnPath => {
                    unlink(model, id);
                    model.report.push(LoadWarning::ParentCycle {
                        piece: model.pieces[id].name.clone(),
                    });
                    break;
                }
                Visit::Pending => {
                    visits[id] = Visit::OnPath;
                    path.push(id);
                    current = model.pieces[id].parent;
                }
            }
        }
        for id in path.drain(..) {
            visits[id] = Visit::Done;
        }
    }
}
