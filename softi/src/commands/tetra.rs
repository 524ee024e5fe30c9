use failure::Error;
use softbody::Command;

use crate::{
    args::{GlobalArgs, TetraArgs},
    ui::{count, fmt_with_thousand_sep},
};
use super::Session;


pub fn run(_global_args: &GlobalArgs, args: &TetraArgs) -> Result<(), Error> {
    let mut session = Session::new();

    progress!(["Reading '{}'", args.source.display()] => {
        session.run(Command::ImportObj(Some(args.source.clone())))?
    });

    session.run(Command::SetSubdivisionLevel(args.subdivision))?;
    progress!(["Copying surface (detail {})", args.detail] => {
        session.run(Command::CopySurface { detail: args.detail })?
    });
    if args.iso {
        progress!(["Creating iso surface"] => {
            session.run(Command::CopyIsoSurface { single_pass: args.single_pass })?
        });
    }

    progress!(["Tetrahedralizing (subdivision level {})", args.subdivision] => {
        session.run(Command::CreateTetrahedra)?
    });

    progress!(["Writing '{}'", args.target.display()] => {
        session.run(Command::ExportObj(Some(args.target.clone())))?
    });

    let model = session.model()?;
    let num_tetrahedra = model.tetra().map_or(0, |t| t.num_tetrahedra());
    let num_tetra_vertices = model.tetra().map_or(0, |t| t.num_vertices());
    println!();
    println!(
        "{} vertices and {} triangles linked to {} tetrahedra ({} tetra vertices)",
        count(model.vertices().len()),
        count(model.num_triangles()),
        count(num_tetrahedra),
        fmt_with_thousand_sep(num_tetra_vertices as u64),
    );

    Ok(())
}
