use cgmath::{Matrix4, Vector3};
use failure::{Error, ResultExt};
use softbody::{
    Command,
    io::{obj::ObjWriter, Writer},
};

use crate::args::{GlobalArgs, SimulateArgs};
use super::Session;


pub fn run(_global_args: &GlobalArgs, args: &SimulateArgs) -> Result<(), Error> {
    let mut session = Session::new();

    progress!(["Reading '{}'", args.source.display()] => {
        session.run(Command::ImportObj(Some(args.source.clone())))?
    });

    if session.model()?.tetra().is_none() {
        warn!(
            "'{}' has no tetrahedral mesh next to it, tetrahedralizing with subdivision \
                level {}",
            args.source.display(),
            args.subdivision,
        );
        session.run(Command::SetSubdivisionLevel(args.subdivision))?;
        progress!(["Tetrahedralizing"] => {
            session.run(Command::CopySurface { detail: 1.0 })?;
            session.run(Command::CreateTetrahedra)?
        });
    }

    session.run(Command::SetGravity(!args.no_gravity))?;
    let pose = Matrix4::from_translation(Vector3::new(0.0, args.height, 0.0));
    session.run(Command::CreateSoftBody { pose })?;

    progress!(["Simulating {} steps of {}s", args.steps, args.dt] => {
        for _ in 0..args.steps {
            session.run(Command::Simulate { dt: args.dt })?;
        }
    });

    let mut deformed = Vec::new();
    session.system.skin_soft_body(0, &mut deformed)?;

    let model = session.model()?;
    progress!(["Writing '{}'", args.target.display()] => {
        ObjWriter::new(&deformed, model.sections(), model.materials())
            .with_name(model.name())
            .write_to_file(&args.target)
            .context(format!("failed to write '{}'", args.target.display()))?
    });

    Ok(())
}
