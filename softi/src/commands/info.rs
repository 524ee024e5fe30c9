use failure::{Error, ResultExt};
use softbody::{
    algo::bounding::ritter_sphere,
    io::{obj, sidecar_path, tet},
};

use crate::{
    args::{GlobalArgs, InfoArgs},
    ui::{count, fmt_with_thousand_sep},
};


pub fn run(_global_args: &GlobalArgs, args: &InfoArgs) -> Result<(), Error> {
    let mesh = progress!(["Reading '{}'", args.file.display()] => {
        obj::read_file(&args.file)
            .context(format!("failed to read '{}'", args.file.display()))?
    });

    let sidecar = sidecar_path(&args.file);
    let tetra = if sidecar.is_file() {
        let tetra = progress!(["Reading '{}'", sidecar.display()] => {
            tet::read_file(&sidecar)
                .context(format!("failed to read '{}'", sidecar.display()))?
        });
        Some(tetra)
    } else {
        None
    };

    println!();
    println!("Graphics mesh:");
    println!("    vertices:   {}", count(mesh.vertices.len()));
    println!("    triangles:  {}", count(mesh.num_triangles()));
    println!("    sections:   {}", count(mesh.sections.len()));
    for section in &mesh.sections {
        let material = mesh.materials.get(section.material).map_or("?", |m| m.name.as_str());
        let triangles = fmt_with_thousand_sep(section.indices.len() as u64 / 3);
        println!("        {:<16} {} triangles", material, triangles);
    }

    if let Some(sphere) = ritter_sphere(mesh.vertices.iter().copied()) {
        let c = sphere.center;
        println!(
            "    bounding sphere: center ({:.3}, {:.3}, {:.3}), radius {:.3}",
            c.x, c.y, c.z, sphere.radius,
        );
    }

    println!();
    match &tetra {
        Some(tetra) => {
            println!("Tetrahedral mesh ('{}'):", sidecar.display());
            println!("    vertices:   {}", count(tetra.num_vertices()));
            println!("    tetrahedra: {}", count(tetra.num_tetrahedra()));
            println!("    links:      {}", count(tetra.links().len()));
            if !tetra.links().is_empty() && tetra.links().len() != mesh.vertices.len() {
                warn!(
                    "the sidecar stores {} links, but the model has {} vertices; links are \
                        rebuilt on import",
                    tetra.links().len(),
                    mesh.vertices.len(),
                );
            }
        }
        None => info!("No tetrahedral mesh ('{}' does not exist)", sidecar.display()),
    }

    Ok(())
}
