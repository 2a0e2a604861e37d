//! Builds a two-stage Dockerfile in code and prints it.

use dfg_core::{
    BaseImage, BuildFile, Cmd, CopyCommand, DockerfileTemplate, Error, RunCommand, Stage, User,
    Workdir,
};

fn main() -> Result<(), Error> {
    let data = BuildFile::new(vec![
        Stage::named(
            "builder",
            vec![
                BaseImage::new("golang:1.7.3", "builder").into(),
                User::named("ozan").into(),
                Workdir::new("/go/src/github.com/alexellis/href-counter/").into(),
                RunCommand::new(["go", "get", "-d", "-v", "golang.org/x/net/html"]).into(),
                CopyCommand::new(["app.go"], ".").into(),
                RunCommand::new([
                    "CGO_ENABLED=0",
                    "GOOS=linux",
                    "go",
                    "build",
                    "-a",
                    "-installsuffix",
                    "cgo",
                    "-o",
                    "app",
                    ".",
                ])
                .into(),
            ],
        ),
        Stage::named(
            "final",
            vec![
                BaseImage::new("alpine:latest", "final").into(),
                RunCommand::new(["apk", "--no-cache", "add", "ca-certificates"]).into(),
                User::new("root", "admin").into(),
                Workdir::new("/root/").into(),
                CopyCommand::new(["/go/src/github.com/alexellis/href-counter/app"], ".")
                    .with_from_stage("builder")
                    .into(),
                Cmd::new(["./app"]).into(),
            ],
        ),
    ]);

    DockerfileTemplate::new(data).render(&mut std::io::stdout().lock())
}
