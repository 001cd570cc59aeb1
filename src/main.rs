fn main() {
    std::process::exit(ideajar_lib::run());
}
