#[cfg(test)]
mod formatting_tests {
    use crate::parser::*;
    use crate::renderer::*;
    use crate::{format_source, FormatError, IndentStyle, RenderConfig, RenderError};
    use pretty_assertions::assert_eq;

    fn render_expression(source: &str, config: &RenderConfig) -> String {
        let expression = parse_expression(source).expect("expression should parse");
        SourceRenderer::new(config)
            .render_fragment(&expression)
            .expect("expression should render")
    }

    fn render_statement(source: &str) -> String {
        let statement = parse_statement(source).expect("statement should parse");
        SourceRenderer::new(&RenderConfig::default())
            .render_fragment(&statement)
            .expect("statement should render")
    }

    fn format(source: &str) -> String {
        format_source(source, &RenderConfig::default()).expect("source should format")
    }

    const SCHEMA_CHAIN: &str =
        "Schema.SObjectType.Account.getRecordTypeInfosByDeveloperName().get('Business').getRecordTypeId()";

    const FIXTURE_CHAIN: &str =
        "Fixtures.Contact(account).put(Contact.RecordTypeId, newRecord[0].Id).put(Contact.My_Lookup__c, newRecord[0].Id).save()";

    const NESTED_ARGUMENT_CHAIN: &str =
        "Fixtures.Contact(account).put(Contact.RecordTypeId, Schema.SObjectType.Contact.getRecordTypeInfosByDeveloperName().get('Person').getRecordTypeId()).put(Contact.My_Lookup__c, newRecord[0].Id).save()";

    #[test]
    fn test_chain_link_count_folds_dotted_receiver() {
        let expression = parse_expression(SCHEMA_CHAIN).unwrap();
        assert_eq!(ChainAnalyzer::expression_link_count(&expression), 3);

        let Expression::Chain(chain) = &expression else {
            panic!("expected a chain, got {:?}", expression.kind());
        };
        let (receiver, links) = ChainAnalyzer::spine(chain);
        assert_eq!(
            receiver,
            &Expression::Primary(Primary::TypeRef(TypeRef::path([
                "Schema",
                "SObjectType",
                "Account"
            ])))
        );
        let members: Vec<&str> = links.iter().map(|link| link.member.as_str()).collect();
        assert_eq!(
            members,
            vec!["getRecordTypeInfosByDeveloperName", "get", "getRecordTypeId"]
        );
    }

    #[test]
    fn test_chain_link_count_with_identifier_receiver() {
        let expression = parse_expression(FIXTURE_CHAIN).unwrap();
        assert_eq!(ChainAnalyzer::expression_link_count(&expression), 4);
    }

    #[test]
    fn test_chains_inside_arguments_are_not_counted() {
        let expression = parse_expression(NESTED_ARGUMENT_CHAIN).unwrap();
        assert_eq!(ChainAnalyzer::expression_link_count(&expression), 4);

        assert_eq!(
            render_expression(NESTED_ARGUMENT_CHAIN, &RenderConfig::default()),
            "Fixtures\n\t.Contact(account)\n\t.put(Contact.RecordTypeId, Schema.SObjectType.Contact.getRecordTypeInfosByDeveloperName().get('Person').getRecordTypeId())\n\t.put(Contact.My_Lookup__c, newRecord[0].Id)\n\t.save()"
        );
    }

    #[test]
    fn test_member_access_links_do_not_explode() {
        let config = RenderConfig::default();
        let expression = parse_expression("accounts.get(0).Name").unwrap();
        let Expression::Chain(chain) = &expression else {
            panic!("expected a chain, got {:?}", expression.kind());
        };
        assert_eq!(ChainAnalyzer::link_count(chain), 2);
        assert_eq!(ChainAnalyzer::call_link_count(chain), 1);

        assert_eq!(render_expression("accounts.get(0).Name", &config), "accounts.get(0).Name");
        assert_eq!(render_expression("this.owner.getName()", &config), "this.owner.getName()");
        assert_eq!(
            render_expression("a.b().c().Name", &config),
            "a\n\t.b()\n\t.c()\n\t.Name"
        );
    }

    #[test]
    fn test_chains_stay_inline_in_arguments_and_headers() {
        assert_eq!(
            render_statement("if (a.b().c()) { foo(x.y().z()).d(); }"),
            "if (a.b().c()) {\n\tfoo(x.y().z()).d();\n}"
        );
        assert_eq!(
            render_statement("for (Account acc : repo.load().all()) { save(acc); }"),
            "for (Account acc : repo.load().all()) {\n\tsave(acc);\n}"
        );
        assert_eq!(
            render_statement("List<Id> ids = new List<Id>{a.b().c()};"),
            "List<Id> ids = new List<Id>{a.b().c()};"
        );
    }

    #[test]
    fn test_non_chain_has_no_links() {
        let expression = parse_expression("a + b").unwrap();
        assert_eq!(ChainAnalyzer::expression_link_count(&expression), 0);
    }

    #[test]
    fn test_chain_layout_threshold() {
        assert_eq!(ChainLayout::for_links(1, 2), ChainLayout::Inline);
        assert_eq!(ChainLayout::for_links(2, 2), ChainLayout::Exploded);
        assert_eq!(ChainLayout::for_links(3, 4), ChainLayout::Inline);
    }

    #[test]
    fn test_exploded_chain_rendering() {
        let rendered = render_expression(SCHEMA_CHAIN, &RenderConfig::default());
        assert_eq!(
            rendered,
            "Schema.SObjectType.Account\n\t.getRecordTypeInfosByDeveloperName()\n\t.get('Business')\n\t.getRecordTypeId()"
        );
    }

    #[test]
    fn test_single_link_stays_inline() {
        let config = RenderConfig::default();
        assert_eq!(render_expression("records.size()", &config), "records.size()");
        assert_eq!(render_expression("this.name", &config), "this.name");
        assert_eq!(render_expression("a?.b()", &config), "a?.b()");
    }

    #[test]
    fn test_chain_threshold_is_configurable() {
        let config = RenderConfig {
            chain_threshold: 5,
            ..RenderConfig::default()
        };
        assert_eq!(render_expression(FIXTURE_CHAIN, &config), FIXTURE_CHAIN);
    }

    #[test]
    fn test_exploded_chain_with_spaces() {
        let config = RenderConfig {
            indent_style: IndentStyle::Spaces,
            indent_width: 2,
            ..RenderConfig::default()
        };
        assert_eq!(render_expression("a.b().c()", &config), "a\n  .b()\n  .c()");
    }

    #[test]
    fn test_modifier_order_preserved() {
        assert_eq!(
            format("global   with sharing virtual class Foo {}"),
            "global with sharing virtual class Foo {\n}\n"
        );
        assert_eq!(
            format("public class Foo { static final public Integer X = 1; }"),
            "public class Foo {\n\tstatic final public Integer X = 1;\n}\n"
        );
    }

    #[test]
    fn test_annotation_modifiers() {
        assert_eq!(
            format("@isTest(SeeAllData=true) private class T { @isTest static void run() {} }"),
            "@isTest(SeeAllData=true) private class T {\n\t@isTest static void run() {\n\t}\n}\n"
        );
    }

    #[test]
    fn test_type_rendering_with_generics_and_suffix() {
        let ty = TypeRef {
            segments: vec![TypeName {
                name: "Map".to_string(),
                arguments: vec![
                    TypeRef::path(["Id"]),
                    TypeRef {
                        segments: vec![TypeName {
                            name: "List".to_string(),
                            arguments: vec![TypeRef::path(["Account"])],
                        }],
                        array_suffix: String::new(),
                    },
                ],
            }],
            array_suffix: "[]".to_string(),
        };
        assert_eq!(TypeRenderer.render_type(&ty).unwrap(), "Map<Id, List<Account>>[]");
        assert_eq!(
            TypeRenderer
                .render_type(&TypeRef::path(["Database", "Batchable"]))
                .unwrap(),
            "Database.Batchable"
        );
    }

    #[test]
    fn test_nested_generics_parse() {
        assert_eq!(
            render_statement("Map<Id,List<Account>> byOwner=new Map<Id,List<Account>>();"),
            "Map<Id, List<Account>> byOwner = new Map<Id, List<Account>>();"
        );
    }

    #[test]
    fn test_empty_type_reference_is_invariant_violation() {
        let ty = TypeRef {
            segments: Vec::new(),
            array_suffix: String::new(),
        };
        assert!(matches!(
            TypeRenderer.render_type(&ty),
            Err(RenderError::InvariantViolation {
                node: NodeKind::TypeRef,
                ..
            })
        ));
    }

    #[test]
    fn test_field_without_declarators_is_invariant_violation() {
        let field = Member::Field(FieldDeclaration {
            modifiers: vec![Modifier::new("private")],
            ty: TypeRef::path(["Integer"]),
            declarators: Vec::new(),
        });
        let config = RenderConfig::default();
        let result = field.render(&RenderContext::new(&config));
        assert_eq!(
            result,
            Err(RenderError::InvariantViolation {
                node: NodeKind::Field,
                detail: "no variable declarators",
            })
        );
    }

    #[test]
    fn test_missing_operator_is_invariant_violation() {
        let expression = Expression::Binary {
            kind: BinaryKind::Arithmetic,
            operator: String::new(),
            left: Box::new(Expression::Primary(Primary::Literal("1".to_string()))),
            right: Box::new(Expression::Primary(Primary::Literal("2".to_string()))),
        };
        let config = RenderConfig::default();
        let error = expression
            .render(&RenderContext::new(&config))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "internal invariant violated in binary expression: no operator text"
        );
    }

    #[test]
    fn test_embedded_query_is_unsupported() {
        let source = "public class Q {\n    void run() {\n        List<Account> accounts = [SELECT Id FROM Account];\n    }\n}";
        let error = format_source(source, &RenderConfig::default()).unwrap_err();
        match &error {
            FormatError::Render(RenderError::UnsupportedConstruct { kind, span }) => {
                assert_eq!(*kind, NodeKind::EmbeddedQuery);
                assert_eq!(*span, Some(Span::new(3, 34)));
            }
            other => panic!("expected an unsupported construct, got {:?}", other),
        }
        assert_eq!(
            error.to_string(),
            "unsupported construct: embedded query at 3:34"
        );
    }

    #[test]
    fn test_dml_on_query_is_unsupported() {
        let source = "public class D { void purge() { delete [SELECT Id FROM Account]; } }";
        let error = format_source(source, &RenderConfig::default()).unwrap_err();
        assert!(matches!(
            error,
            FormatError::Render(RenderError::UnsupportedConstruct {
                kind: NodeKind::EmbeddedQuery,
                ..
            })
        ));
    }

    #[test]
    fn test_dml_statement_forms() {
        let statement = parse_statement("delete [SELECT Id FROM Account];").unwrap();
        let Statement::Dml(dml) = &statement else {
            panic!("expected a DML statement, got {:?}", statement.kind());
        };
        assert_eq!(dml.operation, "delete");
        assert_eq!(dml.expression.kind(), NodeKind::EmbeddedQuery);

        assert_eq!(render_statement("insert acc;"), "insert acc;");
        assert_eq!(render_statement("update (acc);"), "update (acc);");
        assert_eq!(render_statement("upsert new Account(Name = 'x');"), "upsert new Account(Name = 'x');");
        assert_eq!(render_statement("update();"), "update();");
    }

    #[test]
    fn test_unsupported_statement_forms_are_parse_errors() {
        assert!(parse_statement("do { x++; } while (x < 3);").is_err());
        assert!(parse_statement("System.runAs(u) { run(); }").is_err());
        assert!(parse_statement("switch on x { when 1 { run(); } }").is_err());
        assert!(parse_statement("if (x) ;").is_err());
    }

    #[test]
    fn test_with_indent_leaves_caller_depth_alone() {
        let config = RenderConfig::default();
        let context = RenderContext::new(&config).with_depth(2);
        let output = context
            .with_indent(|inner| {
                assert_eq!(inner.depth, 3);
                Ok("first\n\nsecond".to_string())
            })
            .unwrap();
        assert_eq!(output, "\tfirst\n\n\tsecond");
        assert_eq!(context.depth, 2);
    }

    #[test]
    fn test_error_mid_render_leaves_no_output() {
        let source = "public class Q { Integer a = 1; List<Account> b = [SELECT Id FROM Account]; }";
        assert!(format_source(source, &RenderConfig::default()).is_err());
    }

    #[test]
    fn test_nested_indentation_invariant() {
        let source = r#"
            public class Outer {
                public class Inner {
                    Integer run(Integer x) {
                        while (x > 0) {
                            if (x == 2) { x -= 2; } else { x--; }
                            try { x = helper(x); } catch (Exception e) { return -1; }
                        }
                        return x;
                    }
                }
                static { init(); }
            }
        "#;
        let rendered = format(source);

        let mut depth: usize = 0;
        for line in rendered.lines() {
            let trimmed = line.trim_start_matches('\t');
            if trimmed.starts_with('}') {
                depth -= 1;
            }
            let indent = line.len() - trimmed.len();
            assert_eq!(indent, depth, "wrong indentation on line {:?}", line);
            if trimmed.ends_with('{') {
                depth += 1;
            }
        }
        assert_eq!(depth, 0);
        assert!(rendered.contains("\t\t\t\t\tx--;\n"));
    }

    #[test]
    fn test_if_else_if_chain() {
        assert_eq!(
            render_statement("if (a) x = 1; else if (b) { x = 2; } else x = 3;"),
            "if (a) {\n\tx = 1;\n} else if (b) {\n\tx = 2;\n} else {\n\tx = 3;\n}"
        );
    }

    #[test]
    fn test_classic_for_loop() {
        assert_eq!(
            render_statement("for(Integer i=0;i<10;i++) total+=i;"),
            "for (Integer i = 0; i < 10; i++) {\n\ttotal += i;\n}"
        );
        assert_eq!(render_statement("for (;;) { break; }"), "for (;;) {\n\tbreak;\n}");
    }

    #[test]
    fn test_enhanced_for_loop() {
        assert_eq!(
            render_statement("for (Account acc : accounts) { acc.Name = 'x'; }"),
            "for (Account acc : accounts) {\n\tacc.Name = 'x';\n}"
        );
    }

    #[test]
    fn test_try_catch_finally() {
        assert_eq!(
            render_statement("try { insert c; } catch (DmlException e) { throw e; } finally { cleanup(); }"),
            "try {\n\tinsert c;\n} catch (DmlException e) {\n\tthrow e;\n} finally {\n\tcleanup();\n}"
        );
    }

    #[test]
    fn test_try_without_handlers_is_parse_error() {
        let error = parse_statement("try { x(); }").unwrap_err();
        assert!(error.message.contains("expected `catch` or `finally`"));
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(render_statement("{}"), "{\n}");
        assert_eq!(render_statement("while (true) {}"), "while (true) {\n}");
    }

    #[test]
    fn test_operators_kept_verbatim() {
        let config = RenderConfig::default();
        assert_eq!(render_expression("a===b", &config), "a === b");
        assert_eq!(render_expression("!flag&&x<=y", &config), "!flag && x <= y");
        assert_eq!(render_expression("(1<<2)|1", &config), "(1 << 2) | 1");
        assert_eq!(render_expression("n>>>1", &config), "n >>> 1");
        assert_eq!(render_expression("count>=limit", &config), "count >= limit");
    }

    #[test]
    fn test_shift_assignment_glues_greater_tokens() {
        let expression = parse_expression("bits >>= 2").unwrap();
        let Expression::Assignment { operator, .. } = &expression else {
            panic!("expected an assignment, got {:?}", expression.kind());
        };
        assert_eq!(operator, ">>=");
    }

    #[test]
    fn test_cast_and_parenthesized_expressions() {
        let config = RenderConfig::default();
        assert_eq!(render_expression("( Contact ) obj", &config), "(Contact)obj");
        assert_eq!(render_expression("(a) + b", &config), "(a) + b");
        assert_eq!(render_expression("obj instanceof Contact", &config), "obj instanceof Contact");
        assert_eq!(render_expression("Account.class", &config), "Account.class");
    }

    #[test]
    fn test_creators() {
        let config = RenderConfig::default();
        assert_eq!(
            render_expression("new Account(Name='Acme')", &config),
            "new Account(Name = 'Acme')"
        );
        assert_eq!(render_expression("new String[5]", &config), "new String[5]");
        assert_eq!(
            render_expression("new Set<String>{'a','b'}", &config),
            "new Set<String>{'a', 'b'}"
        );
        assert_eq!(
            render_expression("new Map<String, Integer>{'a'=>1,'b'=>2}", &config),
            "new Map<String, Integer>{'a' => 1, 'b' => 2}"
        );
        assert_eq!(render_expression("new List<Id>{}", &config), "new List<Id>{}");
    }

    #[test]
    fn test_nested_prefix_operators_stay_apart() {
        let source = "public class U { void run() { x = - -y; z = + +w; v = - --y; n = -x; } }";
        let rendered = format(source);
        assert!(rendered.contains("x = - -y;"));
        assert!(rendered.contains("z = + +w;"));
        assert!(rendered.contains("v = - --y;"));
        assert!(rendered.contains("n = -x;"));
        assert_eq!(parse(source).unwrap(), parse(&rendered).unwrap());
    }

    #[test]
    fn test_ternary_and_unary() {
        let config = RenderConfig::default();
        assert_eq!(
            render_expression("x>0?-x:x++", &config),
            "x > 0 ? -x : x++"
        );
    }

    #[test]
    fn test_property_accessors() {
        assert_eq!(
            format("public class P { public String name { get; private set; } }"),
            "public class P {\n\tpublic String name {\n\t\tget;\n\t\tprivate set;\n\t}\n}\n"
        );
    }

    #[test]
    fn test_interface_declaration() {
        assert_eq!(
            format("public interface Shape extends Comparable { Decimal area(); String describe(String prefix, Integer precision); }"),
            "public interface Shape extends Comparable {\n\tDecimal area();\n\tString describe(String prefix, Integer precision);\n}\n"
        );
    }

    #[test]
    fn test_enum_declaration() {
        assert_eq!(
            format("public enum Status { ACTIVE , INACTIVE }"),
            "public enum Status {ACTIVE, INACTIVE}\n"
        );
    }

    #[test]
    fn test_constructor_and_initializers() {
        assert_eq!(
            format("public class C { public C(Integer n) { this(n, 0); } static { seed(); } { count = 0; } }"),
            "public class C {\n\tpublic C(Integer n) {\n\t\tthis(n, 0);\n\t}\n\tstatic {\n\t\tseed();\n\t}\n\t{\n\t\tcount = 0;\n\t}\n}\n"
        );
    }

    #[test]
    fn test_parse_error_location() {
        let error = parse("public class {").unwrap_err();
        assert_eq!(error.span, Span::new(1, 14));
        assert!(error.to_string().starts_with("parse error at 1:14: expected identifier"));
    }

    #[test]
    fn test_lexer_errors() {
        assert!(parse("public class A { String s = 'open; }").is_err());
        assert!(parse("public class A { /* never closed }").is_err());
        assert!(parse("public class A { Integer x = 1 # 2; }").is_err());
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(
            format("// header\npublic class A { /* note */ Integer x; }"),
            "public class A {\n\tInteger x;\n}\n"
        );
    }

    #[test]
    fn test_config_from_json() {
        let config = RenderConfig::from_json(r#"{"indent_style": "spaces", "indent_width": 2}"#).unwrap();
        assert_eq!(config.indent_style, IndentStyle::Spaces);
        assert_eq!(config.indent_unit(), "  ");
        assert_eq!(config.chain_threshold, 2);

        assert!(RenderConfig::from_json(r#"{"indent": "tabs"}"#).is_err());
        assert_eq!(RenderConfig::default().indent_unit(), "\t");
    }
}
