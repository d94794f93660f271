//! Raw verb commands: get, status, post, put, delete.

use steelconnection::SConnect;

use crate::cli::{BodyArgs, GetArgs, GlobalOpts, ResourceArgs};
use crate::commands::util::{emit, params, read_body};
use crate::error::CliError;

pub async fn get(sc: &mut SConnect, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let target = args.target;
    let value = sc.get(&target.resource, &params(&target.params)).await?;

    if let Some(path) = args.save {
        sc.savefile(&path).await?;
        if !global.quiet {
            eprintln!("Saved response body to {}", path.display());
        }
        return Ok(());
    }
    emit(global, &value)
}

pub async fn status(sc: &mut SConnect, args: &ResourceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let value = sc.getstatus(&args.resource, &params(&args.params)).await?;
    emit(global, &value)
}

pub async fn post(sc: &mut SConnect, args: &BodyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let body = read_body(args.data.as_deref(), args.file.as_deref())?;
    if !args.target.params.is_empty() {
        return Err(CliError::Validation {
            field: "param".into(),
            reason: "post does not take query parameters".into(),
        });
    }
    let value = sc.post(&args.target.resource, body).await?;
    emit(global, &value)
}

pub async fn put(sc: &mut SConnect, args: &BodyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let body = read_body(args.data.as_deref(), args.file.as_deref())?;
    let value = sc
        .put(&args.target.resource, body, &params(&args.target.params))
        .await?;
    emit(global, &value)
}

pub async fn delete(sc: &mut SConnect, args: &BodyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let body = read_body(args.data.as_deref(), args.file.as_deref())?;
    let value = sc
        .delete(&args.target.resource, body, &params(&args.target.params))
        .await?;
    emit(global, &value)
}
