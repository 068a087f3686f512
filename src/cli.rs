// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .about("Personal finance client: income, expenses, savings and goals")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print JSON instead of tables")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a config file")
                .global(true)
                .value_parser(value_parser!(std::path::PathBuf)),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and store the session")
                .arg(Arg::new("username").short('u').long("username").required(true))
                .arg(Arg::new("password").short('p').long("password").required(true)),
        )
        .subcommand(Command::new("logout").about("Sign out and forget the stored session"))
        .subcommand(
            Command::new("register")
                .about("Create an account")
                .arg(Arg::new("username").long("username").required(true))
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("password").long("password").required(true))
                .arg(Arg::new("confirm").long("confirm").required(true))
                .arg(Arg::new("phone").long("phone").required(true)),
        )
        .subcommand(
            Command::new("forgot-password")
                .about("Request a password reset email")
                .arg(Arg::new("email").long("email").required(true)),
        )
        .subcommand(Command::new("status").about("Show the current session"))
        .subcommand(Command::new("balance").about("Show net balance and totals"))
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record income, an expense or a saving")
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .value_parser(["income", "expense", "saving"]),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(
                            Arg::new("usage-date")
                                .long("usage-date")
                                .help("YYYY-MM-DD; savings only"),
                        ),
                )
                .subcommand(
                    Command::new("list").about("List transactions of one type").arg(
                        Arg::new("type")
                            .long("type")
                            .required(true)
                            .value_parser(["income", "expense", "saving"]),
                    ),
                )
                .subcommand(Command::new("recent").about("Most recent transactions"))
                .subcommand(
                    Command::new("cancel")
                        .about("Cancel a transaction")
                        .arg(Arg::new("id").long("id").required(true)),
                )
                .subcommand(Command::new("cancelled").about("Cancelled transactions")),
        )
        .subcommand(
            Command::new("goal")
                .about("Spending goals per category")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("limit").long("limit").required(true))
                        .arg(Arg::new("start").long("start").required(true))
                        .arg(Arg::new("end").long("end").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("saving").about("Savings").subcommand(
                Command::new("use")
                    .about("Release a matured saving back into the balance")
                    .arg(Arg::new("id").long("id").required(true)),
            ),
        )
        .subcommand(
            Command::new("report")
                .about("Income/expense/saving reports")
                .subcommand(Command::new("day"))
                .subcommand(Command::new("week"))
                .subcommand(Command::new("month"))
                .subcommand(
                    Command::new("custom")
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                ),
        )
        .subcommand(
            Command::new("profile")
                .about("Account profile")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("update")
                        .arg(Arg::new("username").long("username"))
                        .arg(Arg::new("email").long("email"))
                        .arg(Arg::new("phone").long("phone")),
                )
                .subcommand(
                    Command::new("password")
                        .arg(Arg::new("current").long("current").required(true))
                        .arg(Arg::new("new").long("new").required(true)),
                ),
        )
        .subcommand(
            Command::new("account").about("Account lifecycle").subcommand(
                Command::new("delete").about("Delete the account permanently").arg(
                    Arg::new("yes")
                        .long("yes")
                        .help("Confirm deletion")
                        .action(ArgAction::SetTrue),
                ),
            ),
        )
}

